use reqwest::Client;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::fetcher::{Entry, Fetcher};
use crate::notifier::{NotifyItem, Notifier};
use crate::selector::{select_forced, select_new, Selection};
use crate::state::{StateStore, Watermark};

const USER_AGENT: &str = concat!("FeedRelay/", env!("CARGO_PKG_VERSION"));

/// What a single run ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The feed returned nothing (or could not be fetched).
    NoContent { notified: bool },
    /// The feed had no entries newer than the watermark.
    NoUpdate { notified: bool },
    /// `count` entries were delivered and the watermark moved.
    Delivered { count: usize, watermark: Watermark },
}

pub struct Runner {
    config: Config,
    fetcher: Fetcher,
    notifier: Notifier,
    store: StateStore,
}

impl Runner {
    /// Build every component from `config`. Fails before any network
    /// traffic when the webhook is not configured.
    pub fn new(config: Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()?;

        let notifier = Notifier::new(client.clone(), &config)?;
        let fetcher = Fetcher::new(client, config.feed_url.clone());
        let store = StateStore::new(config.state_file.clone());

        Ok(Self {
            config,
            fetcher,
            notifier,
            store,
        })
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        let mut state = self.store.load()?;
        info!(
            "Loaded watermark {:?} from {}",
            state.last_id.as_str(),
            self.store.path().display()
        );

        let entries = match self.fetcher.fetch().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to fetch feed '{}': {}", self.fetcher.url(), e);
                Vec::new()
            }
        };

        let selection = if self.config.force_send {
            select_forced(&entries, self.config.force_items)
        } else {
            select_new(&entries, &state.last_id, self.config.max_items_per_run)
        };

        let batch: Vec<&Entry> = match selection {
            Selection::NoContent => {
                info!("Feed returned no entries");
                let notified = self.config.notify_on_empty
                    && self
                        .notice(
                            &self.config.bot_name,
                            "No content fetched",
                            "Check that the feed URL is reachable, or try again later.",
                        )
                        .await;
                return Ok(RunOutcome::NoContent { notified });
            }
            Selection::NoUpdate => {
                info!("No new entries since {:?}", state.last_id.as_str());
                let notified = self.config.always_notify
                    && self
                        .notice(
                            &self.config.card_title,
                            "No updates",
                            "This run found no new entries.",
                        )
                        .await;
                return Ok(RunOutcome::NoUpdate { notified });
            }
            items @ Selection::Items(_) => items.into_delivery_order(),
        };

        let items: Vec<NotifyItem> = batch.iter().map(|e| NotifyItem::from(*e)).collect();
        let title = if self.config.force_send {
            format!("{} (test)", self.config.card_title)
        } else {
            self.config.card_title.clone()
        };

        info!("Delivering {} new entries", items.len());
        self.notifier.send(&title, &items).await?;

        // entries[0] is the newest item in the feed, delivered or not
        let watermark = Watermark::new(entries[0].id.clone());
        state.last_id = watermark.clone();
        self.store.save(&state)?;
        info!("Advanced watermark to {:?}", watermark.as_str());

        Ok(RunOutcome::Delivered {
            count: items.len(),
            watermark,
        })
    }

    /// Send a single-item notice pointing at the feed, with `detail` shown
    /// even when summaries are off. Failures are logged, never propagated.
    async fn notice(&self, title: &str, headline: &str, detail: &str) -> bool {
        let item = NotifyItem::new(
            headline,
            self.config.feed_url.clone(),
            Some(detail.to_string()),
        );
        match self.notifier.send_notice(title, &item).await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to send notice '{}': {}", headline, e);
                false
            }
        }
    }
}
