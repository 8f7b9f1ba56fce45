//! XKCD comics.

use super::{CommandContext, CommandHandler};
use crate::error::{AppError, AppResult};
use crate::throttle::Throttle;
use api_clients::{Comic, XkcdClient};
use async_trait::async_trait;
use discord_client::CommandArgs;
use interactive::{ControlDescriptor, Reply, View};
use std::sync::Arc;
use std::time::Duration;

pub struct XkcdHandler {
    xkcd: Arc<XkcdClient>,
}

impl XkcdHandler {
    pub fn new(xkcd: Arc<XkcdClient>) -> Self {
        Self { xkcd }
    }
}

fn comic_reply(comic: &Comic) -> Reply {
    let mut view = View::titled(format!("{}: {}", comic.num, comic.title));
    view.url = Some(comic.url());
    view.image = Some(comic.img.clone());
    let published = comic
        .published()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().timestamp());
    view.description = Some(match published {
        Some(ts) => format!("{}\n\n<t:{}:D>", comic.alt, ts),
        None => comic.alt.clone(),
    });

    let mut links = vec![
        ControlDescriptor::link("View on XKCD", comic.url()),
        ControlDescriptor::link("Explain it!", comic.explain_url()),
    ];
    if !comic.link.is_empty() {
        links.push(ControlDescriptor::link("Link in Comic", &comic.link));
    }
    Reply::view(view).with_row(links)
}

#[async_trait]
impl CommandHandler for XkcdHandler {
    fn name(&self) -> &str {
        "xkcd"
    }

    fn usage(&self) -> &str {
        "`/xkcd [comic] [random]` - View an XKCD comic, the latest by default"
    }

    fn throttle(&self) -> Option<Throttle> {
        Some(Throttle::new(1, Duration::from_secs(5)))
    }

    async fn execute(&self, _ctx: &CommandContext, args: &CommandArgs) -> AppResult<Reply> {
        let comic = if args.bool("random").unwrap_or(false) {
            self.xkcd.random().await?
        } else {
            match args.int("comic") {
                Some(num) => {
                    let num = u32::try_from(num)
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or_else(|| AppError::BadRequest("That comic number is invalid!".into()))?;
                    self.xkcd.comic(num).await?
                }
                None => self.xkcd.latest().await?,
            }
        };
        Ok(comic_reply(&comic))
    }
}
