/// Durable subscription to a named backend event channel
///
/// Wraps an [`EventChannel`] feed in a pump task that hands each event to a
/// callback, one at a time and in arrival order. The returned
/// [`SubscriptionHandle`] owns the pump; unsubscribing waits for the pump to
/// stop, so neither callback is invoked after `unsubscribe` returns.
///
/// Sources reconnect on their own; a feed that ends while still subscribed
/// means the transport gave up, and `on_closed` receives
/// [`GatewayError::Closed`].
use cowork_core::{AgentEvent, EventChannel, GatewayError, GatewayResult};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Subscribe `on_event` to `channel`.
pub async fn subscribe<F, C>(
    source: &dyn EventChannel,
    channel: &str,
    mut on_event: F,
    on_closed: C,
) -> GatewayResult<SubscriptionHandle>
where
    F: FnMut(AgentEvent) + Send + 'static,
    C: FnOnce(GatewayError) + Send + 'static,
{
    let mut rx = source.open(channel).await?;
    info!("Subscribed to event channel {}", channel);

    let name = channel.to_string();
    let pump = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            debug!("Event on {}: {}", name, event.kind);
            on_event(event);
        }
        warn!("Event channel {} closed by transport", name);
        on_closed(GatewayError::Closed(name));
    });

    Ok(SubscriptionHandle {
        channel: channel.to_string(),
        pump: Some(pump),
    })
}

/// Handle to an active subscription
#[derive(Debug)]
pub struct SubscriptionHandle {
    channel: String,
    pump: Option<JoinHandle<()>>,
}

impl SubscriptionHandle {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Whether events are still being delivered
    pub fn is_active(&self) -> bool {
        self.pump.as_ref().is_some_and(|pump| !pump.is_finished())
    }

    /// Stop delivery. No callback runs once this returns.
    pub async fn unsubscribe(mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
            // Cancellation or normal completion, either way the pump is gone
            let _ = pump.await;
        }
        info!("Unsubscribed from event channel {}", self.channel);
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.take() {
            debug!("Subscription to {} dropped without unsubscribe", self.channel);
            pump.abort();
        }
    }
}
