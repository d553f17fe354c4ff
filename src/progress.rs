//! Spinner shown while a request is loading.

use std::time::Duration;

use fetcher_core::Signal;
use indicatif::{ProgressBar, ProgressStyle};

/// Spawns a spinner for the next request driven through `loading`.
///
/// The spinner appears once `loading` first changes and clears when it is
/// false again, so it may be spawned before the request starts. Returns
/// `None` when the spinner is disabled.
pub(crate) fn spawn_spinner(
    enabled: bool,
    loading: &Signal<bool>,
    message: String,
) -> Option<tokio::task::JoinHandle<()>> {
    if !enabled {
        return None;
    }
    // Subscribe now so a request that starts and ends before the task runs
    // is still observed.
    let mut rx = loading.subscribe();
    Some(tokio::spawn(async move {
        if rx.changed().await.is_err() {
            return;
        }

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(message);
        spinner.enable_steady_tick(Duration::from_millis(100));

        let _ = rx.wait_for(|busy| !busy).await;

        spinner.finish_and_clear();
    }))
}
