//! Timer-driven poll loop: scan, reply, label

use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::client::GmailClient;
use crate::config::{Config, PollConfig};
use crate::error::Result;
use crate::label_manager::LabelManager;
use crate::reply::ReplyComposer;
use crate::scanner::MessageScanner;

/// Inclusive range of whole seconds to wait between ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollInterval {
    pub min_secs: u64,
    pub max_secs: u64,
}

impl PollInterval {
    /// Bounds given in the wrong order are swapped
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        Self {
            min_secs: min_secs.min(max_secs),
            max_secs: max_secs.max(min_secs),
        }
    }

    /// Draw the next delay uniformly from `[min_secs, max_secs]`
    pub fn next_delay<R: Rng>(&self, rng: &mut R) -> Duration {
        Duration::from_secs(rng.gen_range(self.min_secs..=self.max_secs))
    }
}

impl From<&PollConfig> for PollInterval {
    fn from(config: &PollConfig) -> Self {
        Self::new(config.min_interval_secs, config.max_interval_secs)
    }
}

impl Default for PollInterval {
    fn default() -> Self {
        Self::from(&PollConfig::default())
    }
}

/// Outcome of a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub found: usize,
    pub replied: usize,
    pub labeled: usize,
}

/// Replies to and labels unread inbox messages on a randomized interval
pub struct Poller {
    scanner: MessageScanner,
    composer: ReplyComposer,
    labels: LabelManager,
    label_id: String,
    interval: PollInterval,
}

impl Poller {
    /// Check the poll settings, then resolve the label and assemble the loop
    pub async fn initialize(client: Arc<dyn GmailClient>, config: &Config) -> Result<Self> {
        config.validate()?;

        let mut labels = LabelManager::new(Arc::clone(&client), config.labels.name.clone());
        let label_id = labels.ensure_label().await?;

        Ok(Self {
            scanner: MessageScanner::new(Arc::clone(&client), config.poll.query.clone()),
            composer: ReplyComposer::new(client, config.reply.clone()),
            labels,
            label_id,
            interval: PollInterval::from(&config.poll),
        })
    }

    pub fn label_id(&self) -> &str {
        &self.label_id
    }

    /// One pass over the current unread set.
    ///
    /// Messages are handled one at a time: reply, then label. The first
    /// failure aborts the rest of the batch; untouched messages are still
    /// unread and in the inbox, so the next tick picks them up.
    pub async fn run_tick(&self) -> Result<TickReport> {
        let messages = self.scanner.list_unreplied().await?;
        info!("Unreplied messages: {}", messages.len());

        let mut report = TickReport {
            found: messages.len(),
            ..Default::default()
        };

        for message in &messages {
            self.composer.reply(message).await?;
            report.replied += 1;
            info!("Replied to: {}", message.id);

            self.labels.apply_label(&message.id, &self.label_id).await?;
            report.labeled += 1;
            info!("Added label to: {}", message.id);
        }

        Ok(report)
    }

    /// Run ticks until `cancel` fires.
    ///
    /// The next delay is drawn only after the previous tick has finished, so
    /// ticks never overlap. Tick failures are logged and the loop carries on.
    /// Cancellation also interrupts a tick that is still in flight.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(
            "Poll loop started ({}-{}s interval)",
            self.interval.min_secs, self.interval.max_secs
        );

        loop {
            let delay = self.interval.next_delay(&mut rand::thread_rng());

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                result = self.run_tick() => {
                    if let Err(e) = result {
                        error!("Poll tick failed: {}", e);
                    }
                }
            }
        }

        info!("Poll loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockTestGmailClient;
    use crate::error::GmailError;
    use crate::models::{MessageHeaders, MessageRef};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn client_with_label() -> MockTestGmailClient {
        let mut client = MockTestGmailClient::new();
        client
            .expect_create_label()
            .returning(|_| Ok("Label_1".to_string()));
        client
    }

    #[test]
    fn test_next_delay_within_bounds() {
        let interval = PollInterval::default();
        let mut rng = StdRng::seed_from_u64(7);

        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            let delay = interval.next_delay(&mut rng);
            assert!(delay >= Duration::from_secs(5));
            assert!(delay <= Duration::from_secs(10));
            seen.insert(delay.as_secs());
        }
        // both ends are reachable
        assert!(seen.contains(&5));
        assert!(seen.contains(&10));
    }

    #[test]
    fn test_fixed_interval() {
        let interval = PollInterval::new(3, 3);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(interval.next_delay(&mut rng), Duration::from_secs(3));
    }

    #[test]
    fn test_swapped_bounds_are_reordered() {
        let interval = PollInterval::new(10, 5);
        assert_eq!(interval, PollInterval::new(5, 10));

        let mut rng = StdRng::seed_from_u64(3);
        let delay = interval.next_delay(&mut rng);
        assert!(delay >= Duration::from_secs(5) && delay <= Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_initialize_rejects_inverted_interval() {
        let mut client = MockTestGmailClient::new();
        client.expect_create_label().never();

        let mut config = Config::default();
        config.poll.min_interval_secs = 10;
        config.poll.max_interval_secs = 5;

        let result = Poller::initialize(Arc::new(client), &config).await;
        assert!(matches!(result, Err(GmailError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_initialize_resolves_label() {
        let client = client_with_label();
        let poller = Poller::initialize(Arc::new(client), &Config::default())
            .await
            .unwrap();
        assert_eq!(poller.label_id(), "Label_1");
    }

    #[tokio::test]
    async fn test_initialize_fails_when_label_fails() {
        let mut client = MockTestGmailClient::new();
        client
            .expect_create_label()
            .returning(|_| Err(GmailError::AuthError("token revoked".to_string())));

        let result = Poller::initialize(Arc::new(client), &Config::default()).await;
        assert!(matches!(result, Err(GmailError::AuthError(_))));
    }

    #[tokio::test]
    async fn test_empty_tick_sends_nothing() {
        let mut client = client_with_label();
        client
            .expect_list_message_refs()
            .times(1)
            .returning(|_| Ok(Vec::new()));
        client.expect_get_message_headers().never();
        client.expect_send_message().never();
        client.expect_modify_labels().never();

        let poller = Poller::initialize(Arc::new(client), &Config::default())
            .await
            .unwrap();
        let report = poller.run_tick().await.unwrap();
        assert_eq!(report, TickReport::default());
    }

    #[tokio::test]
    async fn test_tick_replies_then_labels_each_message() {
        let mut client = client_with_label();
        client
            .expect_list_message_refs()
            .returning(|_| Ok(vec![MessageRef::new("m1"), MessageRef::new("m2")]));
        client.expect_get_message_headers().times(2).returning(|id, _| {
            Ok(MessageHeaders::new(id)
                .with_header("Subject", "Hi")
                .with_header("From", "A <a@x.com>"))
        });
        client
            .expect_send_message()
            .times(2)
            .returning(|_| Ok(()));
        client
            .expect_modify_labels()
            .times(2)
            .returning(|_, _, _| Ok(()));

        let poller = Poller::initialize(Arc::new(client), &Config::default())
            .await
            .unwrap();
        let report = poller.run_tick().await.unwrap();
        assert_eq!(
            report,
            TickReport {
                found: 2,
                replied: 2,
                labeled: 2
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_cancel_and_survives_tick_errors() {
        let mut client = client_with_label();
        // ticks at 5s, 10s, 15s, 20s; cancelled at 22s
        client.expect_list_message_refs().times(4).returning(|_| {
            Err(GmailError::NetworkError("connection reset".to_string()))
        });

        let mut config = Config::default();
        config.poll.min_interval_secs = 5;
        config.poll.max_interval_secs = 5;

        let poller = Poller::initialize(Arc::new(client), &config).await.unwrap();
        let cancel = CancellationToken::new();

        let canceller = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(22)).await;
                cancel.cancel();
            })
        };

        poller.run(cancel).await;
        canceller.await.unwrap();
    }

    #[tokio::test]
    async fn test_run_returns_immediately_when_already_cancelled() {
        let mut client = client_with_label();
        client.expect_list_message_refs().never();

        let poller = Poller::initialize(Arc::new(client), &Config::default())
            .await
            .unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        poller.run(cancel).await;
    }

    /// Client whose inbox listing never completes
    struct StalledClient;

    #[async_trait::async_trait]
    impl GmailClient for StalledClient {
        async fn list_message_refs(&self, _query: &str) -> Result<Vec<MessageRef>> {
            std::future::pending().await
        }

        async fn get_message_headers(
            &self,
            _id: &str,
            _names: &[String],
        ) -> Result<MessageHeaders> {
            std::future::pending().await
        }

        async fn send_message(&self, _raw: &str) -> Result<()> {
            std::future::pending().await
        }

        async fn create_label(&self, _name: &str) -> Result<String> {
            Ok("Label_1".to_string())
        }

        async fn list_labels(&self) -> Result<Vec<crate::models::LabelInfo>> {
            Ok(Vec::new())
        }

        async fn modify_labels(
            &self,
            _message_id: &str,
            _add_label_ids: &[String],
            _remove_label_ids: &[String],
        ) -> Result<()> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_stalled_tick() {
        let poller = Poller::initialize(Arc::new(StalledClient), &Config::default())
            .await
            .unwrap();
        let cancel = CancellationToken::new();

        let handle = {
            let cancel = cancel.clone();
            tokio::spawn(async move { poller.run(cancel).await })
        };

        // first tick starts by 10s and never finishes on its own
        tokio::time::sleep(Duration::from_secs(11)).await;
        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(3600), handle)
            .await
            .expect("poll loop ignored cancellation")
            .unwrap();
    }
}
