//! Web and image search through DuckDuckGo.

use super::{unknown_subcommand, CommandContext, CommandHandler};
use crate::error::{AppError, AppResult};
use crate::throttle::Throttle;
use api_clients::{
    ImageColor, ImageLayout, ImageLicense, ImageOptions, ImageResult, ImageSize, ImageType,
    SafeSearch, SearchClient, SearchOptions, SearchResult, TimeRange,
};
use async_trait::async_trait;
use discord_client::CommandArgs;
use interactive::{cutoff_text, Author, ControlDescriptor, Reply, View};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;

static BOLD_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?b>").expect("valid bold tag regex"));

const DESCRIPTION_LIMIT: usize = 4096;

pub struct SearchHandler {
    search: Arc<SearchClient>,
}

impl SearchHandler {
    pub fn new(search: Arc<SearchClient>) -> Self {
        Self { search }
    }

    fn safe_search(args: &CommandArgs) -> SafeSearch {
        args.int("safesearch")
            .and_then(SafeSearch::from_value)
            .unwrap_or_default()
    }

    fn image_options(args: &CommandArgs) -> ImageOptions {
        fn filter<T: Default>(args: &CommandArgs, name: &str, parse: fn(&str) -> Option<T>) -> T {
            args.str(name).and_then(parse).unwrap_or_default()
        }

        ImageOptions {
            safe_search: Self::safe_search(args),
            size: filter(args, "size", ImageSize::from_code),
            kind: filter(args, "type", ImageType::from_code),
            layout: filter(args, "layout", ImageLayout::from_code),
            color: filter(args, "color", ImageColor::from_code),
            license: filter(args, "license", ImageLicense::from_code),
        }
    }

    fn options(args: &CommandArgs) -> SearchOptions {
        SearchOptions {
            safe_search: Self::safe_search(args),
            time: args
                .str("time")
                .and_then(TimeRange::from_code)
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl CommandHandler for SearchHandler {
    fn name(&self) -> &str {
        "search"
    }

    fn usage(&self) -> &str {
        "`/search web|images <query> [safesearch] [filters...] [ephemeral]` - Search the web or images with DuckDuckGo"
    }

    fn throttle(&self) -> Option<Throttle> {
        Some(Throttle::new(1, Duration::from_secs(10)))
    }

    /// Non-strict searches are only shown to the user who asked.
    fn ephemeral(&self, args: &CommandArgs) -> bool {
        args.bool("ephemeral").unwrap_or(false) || Self::safe_search(args) != SafeSearch::Strict
    }

    async fn execute(&self, _ctx: &CommandContext, args: &CommandArgs) -> AppResult<Reply> {
        let subcommand = args.subcommand();
        if !matches!(subcommand, Some("web") | Some("images")) {
            return Ok(unknown_subcommand());
        }
        let query = args
            .str("query")
            .ok_or_else(|| AppError::BadRequest("A query is required!".into()))?;

        let reply = if subcommand == Some("images") {
            let results = self.search.images(query, Self::image_options(args)).await?;
            image_reply(query, &results)
        } else {
            let results = self.search.search(query, Self::options(args)).await?;
            web_reply(query, &results)
        };
        Ok(if self.ephemeral(args) { reply.ephemeral() } else { reply })
    }
}

fn more_results(total: usize) -> String {
    let more = total.saturating_sub(1);
    format!("... {} more result{}", more, if more == 1 { "" } else { "s" })
}

fn no_results() -> Reply {
    Reply::text("No results were found for this query.")
}

fn web_reply(query: &str, results: &[SearchResult]) -> Reply {
    let Some(top) = results.first() else {
        return no_results();
    };

    let mut view = View::titled(html_escape::decode_html_entities(&top.title));
    view.url = Some(top.url.clone());
    view.author = Some(Author {
        name: top.hostname.clone(),
        url: Some(format!("https://{}", top.hostname)),
        icon_url: Some(top.icon.clone()).filter(|icon| !icon.is_empty()),
    });
    let description = BOLD_TAG.replace_all(&top.description, "**");
    view.description = Some(cutoff_text(
        &html_escape::decode_html_entities(&description),
        DESCRIPTION_LIMIT,
    ));
    view.footer = Some(more_results(results.len()));

    Reply::view(view).with_row(vec![ControlDescriptor::link(
        "More on DuckDuckGo",
        format!(
            "https://duckduckgo.com/?q={}&ia=web",
            urlencoding::encode(query)
        ),
    )])
}

fn image_reply(query: &str, results: &[ImageResult]) -> Reply {
    let Some(top) = results.first() else {
        return no_results();
    };

    let mut view = View::titled(&top.title);
    view.url = Some(top.url.clone()).filter(|url| !url.is_empty());
    view.image = Some(top.image.clone());
    view.footer = Some(format!(
        "[{}x{}]\n{}",
        top.width,
        top.height,
        more_results(results.len())
    ));

    Reply::view(view).with_row(vec![ControlDescriptor::link(
        "More on DuckDuckGo",
        format!(
            "https://duckduckgo.com/?q={}&iar=images&iax=images&ia=images",
            urlencoding::encode(query)
        ),
    )])
}
