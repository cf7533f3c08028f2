use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use notify::event::{CreateKind, ModifyKind};
use notify::{Event, EventKind, RecursiveMode, Watcher, recommended_watcher};
use tokio::sync::mpsc::{self, Sender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::config::{Configuration, SettingKey};
use crate::events::HostEvent;

/// Keys to announce for a settings transition.
///
/// A source or layout change triggers a full rebuild that also picks up the
/// rotation interval and colors, so only that key is reported. Otherwise
/// every changed key is reported in order.
pub fn notifications(old: &Configuration, new: &Configuration) -> Vec<SettingKey> {
    let keys = Configuration::changed_keys(old, new);
    match keys.iter().copied().find(SettingKey::requires_rebuild) {
        Some(key) => vec![key],
        None => keys,
    }
}

/// Watch the YAML settings file and forward changes to the engine.
///
/// Invalid or half-written files are logged and ignored; the last good
/// snapshot stays in effect.
#[instrument(skip(initial, to_engine, cancel), fields(file = %path.display()))]
pub async fn run(
    path: PathBuf,
    initial: Configuration,
    to_engine: Sender<HostEvent>,
    cancel: CancellationToken,
) -> Result<()> {
    let dir = watch_dir(&path);
    let file_name = path.file_name().map(ToOwned::to_owned);

    let (watch_tx, mut watch_rx) = mpsc::channel::<notify::Result<Event>>(32);
    let mut watcher = recommended_watcher(move |res| {
        let _ = watch_tx.blocking_send(res);
    })?;
    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("failed to watch {}", dir.display()))?;
    info!(watching = %dir.display(), "settings watcher initialized");

    let mut current = initial;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("cancel received; exiting settings task");
                break;
            }

            Some(res) = watch_rx.recv() => match res {
                Ok(event) => {
                    let touches_file = event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == file_name.as_deref());
                    if !touches_file || !is_content_change(&event.kind) {
                        debug!(kind = ?event.kind, "settings: ignored");
                        continue;
                    }
                    let next = match Configuration::from_yaml_file(&path).and_then(Configuration::validated) {
                        Ok(cfg) => cfg,
                        Err(err) => {
                            warn!("settings reload rejected: {err:#}");
                            continue;
                        }
                    };
                    for key in notifications(&current, &next) {
                        info!(%key, "settings: changed");
                        let event = HostEvent::SettingChanged { key, config: next.clone() };
                        if to_engine.send(event).await.is_err() {
                            info!("engine channel closed; exiting settings task");
                            return Ok(());
                        }
                    }
                    current = next;
                }
                Err(err) => error!("watch error: {err}"),
            }
        }
    }
    Ok(())
}

fn watch_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn is_content_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(CreateKind::File | CreateKind::Any)
            | EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Name(_) | ModifyKind::Any)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn rebuild_key_absorbs_other_changes() {
        let old = Configuration::default();
        let new = Configuration {
            image_filepath: "/photos/b.jpg".into(),
            multi_rotation_time: Duration::from_secs(5),
            ..Configuration::default()
        };
        assert_eq!(notifications(&old, &new), vec![SettingKey::ImageFilepath]);
    }

    #[test]
    fn cosmetic_changes_are_reported_individually() {
        let old = Configuration::default();
        let new = Configuration {
            multi_rotation_time: Duration::from_secs(5),
            background_color: [10, 10, 10],
            ..Configuration::default()
        };
        assert_eq!(
            notifications(&old, &new),
            vec![SettingKey::MultiRotationTime, SettingKey::Colors]
        );
        assert!(notifications(&new, &new).is_empty());
    }

    #[test]
    fn bare_file_name_watches_current_dir() {
        assert_eq!(watch_dir(Path::new("wallcover.yaml")), PathBuf::from("."));
        assert_eq!(watch_dir(Path::new("/etc/w/c.yaml")), PathBuf::from("/etc/w"));
    }

    #[test]
    fn only_content_changes_trigger_reload() {
        assert!(is_content_change(&EventKind::Create(CreateKind::File)));
        assert!(is_content_change(&EventKind::Modify(ModifyKind::Any)));
        assert!(!is_content_change(&EventKind::Access(notify::event::AccessKind::Any)));
    }
}
