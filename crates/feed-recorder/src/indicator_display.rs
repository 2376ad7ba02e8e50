use crate::AppResult;

use feed_recorder_core::IndicatorState;
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    sync::watch,
};
use tracing::{debug, instrument};

/// Text shown for each indicator state.
pub(crate) fn indicator_label(state: IndicatorState) -> &'static str {
    match state {
        IndicatorState::Idle => "[ ] idle",
        IndicatorState::Recording => "[REC] recording",
    }
}

/// Print every indicator change to `out` until the coordinator goes away.
///
/// Returns the writer so callers can inspect what was shown.
#[instrument(skip_all)]
pub(crate) async fn run_indicator_display<W>(
    mut indicator: watch::Receiver<IndicatorState>,
    mut out: W,
) -> AppResult<W>
where
    W: AsyncWrite + Unpin,
{
    while indicator.changed().await.is_ok() {
        let state = *indicator.borrow_and_update();
        debug!(state = ?state, "Indicator changed");

        out.write_all(indicator_label(state).as_bytes()).await?;
        out.write_all(b"\n").await?;
        out.flush().await?;
    }

    Ok(out)
}
