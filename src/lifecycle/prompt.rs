use std::future::Future;
use std::io::BufRead;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// How the final "press Enter" pause ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseOutcome {
    Confirmed,
    Interrupted,
}

/// Waits for `confirmed` unless the run is, or becomes, cancelled.
pub async fn pause_until<F>(confirmed: F, cancel: &CancellationToken) -> PauseOutcome
where
    F: Future,
{
    if cancel.is_cancelled() {
        return PauseOutcome::Interrupted;
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => PauseOutcome::Interrupted,
        _ = confirmed => PauseOutcome::Confirmed,
    }
}

/// Resolves once a line is read from stdin (or stdin closes).
///
/// The read happens on a detached thread, so an abandoned prompt never keeps
/// the runtime from shutting down.
pub fn enter_pressed() -> oneshot::Receiver<()> {
    let (tx, rx) = oneshot::channel();
    std::thread::spawn(move || {
        let mut line = String::new();
        let _ = std::io::stdin().lock().read_line(&mut line);
        let _ = tx.send(());
    });
    rx
}
