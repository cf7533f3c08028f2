use anyhow::{Context, Result};
use tokio::select;
use tokio::sync::mpsc::Receiver;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::engine::Engine;
use crate::events::HostEvent;
use crate::render::surface::SurfaceHolder;

/// Serialized handler for one wallpaper instance.
///
/// Host events, the rotation timer and draw requests all run on this loop,
/// one at a time, so the cache is never read while it is being rebuilt.
/// Decoding and compositing happen on the blocking pool; the loop awaits
/// each step before taking the next one.
/// Returns the engine and surface once cancelled or once the host hangs up.
pub async fn run<S>(
    mut engine: Engine,
    mut surface: S,
    mut events: Receiver<HostEvent>,
    cancel: CancellationToken,
) -> Result<(Engine, S)>
where
    S: SurfaceHolder + Send + 'static,
{
    loop {
        let rotation = engine.rotation_deadline();
        let draw_requested = engine.draw_requested();
        select! {
            biased;

            _ = cancel.cancelled() => {
                info!("cancel received; exiting wallpaper task");
                break;
            }

            _ = async {
                match rotation {
                    Some(due) => sleep_until(due).await,
                    None => std::future::pending().await,
                }
            } => {
                let now = Instant::now();
                let ticked;
                (engine, surface, ticked) =
                    off_runtime(engine, surface, move |engine, _| engine.on_rotation_due(now)).await?;
                if ticked {
                    debug!(stats = ?engine.stats(), "rotation tick");
                }
            }

            _ = std::future::ready(()), if draw_requested => {
                let outcome;
                (engine, surface, outcome) = off_runtime(engine, surface, |engine, surface| {
                    engine.take_draw_request();
                    engine.draw(surface)
                })
                .await?;
                trace!(?outcome, "frame");
            }

            maybe_event = events.recv() => match maybe_event {
                Some(event) => {
                    debug!(?event, "host event");
                    let now = Instant::now();
                    (engine, surface, _) = off_runtime(engine, surface, move |engine, surface| {
                        if let HostEvent::SurfaceChanged { width, height } = &event {
                            surface.configure(*width, *height);
                        }
                        engine.handle(event, now);
                    })
                    .await?;
                }
                None => {
                    info!("host event channel closed; exiting wallpaper task");
                    break;
                }
            }
        }
    }
    info!(stats = ?engine.stats(), "wallpaper engine stopped");
    Ok((engine, surface))
}

/// Run one engine step on the blocking pool and hand the state back.
async fn off_runtime<S, T, F>(mut engine: Engine, mut surface: S, work: F) -> Result<(Engine, S, T)>
where
    S: SurfaceHolder + Send + 'static,
    T: Send + 'static,
    F: FnOnce(&mut Engine, &mut S) -> T + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let out = work(&mut engine, &mut surface);
        (engine, surface, out)
    })
    .await
    .context("wallpaper step panicked")
}
