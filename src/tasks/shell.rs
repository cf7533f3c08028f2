use std::time::Duration;

use anyhow::{Result, bail};
use tokio::sync::mpsc::Sender;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::events::HostEvent;

/// Parameters of the simulated desktop shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellOptions {
    pub width: u32,
    pub height: u32,
    /// Number of home-screen pages swiped across.
    pub pages: u32,
    /// Delay between page swipes; `None` keeps the first page.
    pub swipe_every: Option<Duration>,
}

/// Scroll offset of page `step` in a back-and-forth sweep over `pages`.
pub fn sweep_offset(step: u64, pages: u32) -> f32 {
    if pages < 2 {
        return 0.0;
    }
    let last = u64::from(pages - 1);
    let period = last * 2;
    let pos = step % period;
    let page = if pos <= last { pos } else { period - pos };
    page as f32 / last as f32
}

/// Drive the engine the way a launcher does: report the surface, show the
/// wallpaper, then swipe across pages until cancelled.
pub async fn run(opts: ShellOptions, to_engine: Sender<HostEvent>, cancel: CancellationToken) -> Result<()> {
    let startup = [
        HostEvent::SurfaceChanged {
            width: opts.width,
            height: opts.height,
        },
        HostEvent::VisibilityChanged(true),
        HostEvent::OffsetsChanged(0.0),
    ];
    for event in startup {
        if to_engine.send(event).await.is_err() {
            bail!("engine channel closed during startup");
        }
    }
    info!(width = opts.width, height = opts.height, "surface created");

    let Some(period) = opts.swipe_every else {
        cancel.cancelled().await;
        return Ok(());
    };
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;
    let mut step = 0u64;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                step += 1;
                let offset = sweep_offset(step, opts.pages);
                debug!(step, offset, "swipe");
                if to_engine.send(HostEvent::OffsetsChanged(offset)).await.is_err() {
                    break;
                }
            }
        }
    }
    info!("shell stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_bounces_between_edges() {
        let offsets: Vec<f32> = (0..9).map(|s| sweep_offset(s, 5)).collect();
        assert_eq!(offsets, vec![0.0, 0.25, 0.5, 0.75, 1.0, 0.75, 0.5, 0.25, 0.0]);
    }

    #[test]
    fn single_page_never_moves() {
        assert_eq!(sweep_offset(3, 1), 0.0);
        assert_eq!(sweep_offset(3, 0), 0.0);
    }
}
