use std::collections::HashMap;
use std::thread::{self, JoinHandle};
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use global_hotkey::hotkey::HotKey;
use crate::core::channel::CommandSender;
use crate::core::config::HotkeyConfig;
use crate::hotkeys::TransportHotkey;

/// Turn the config table into hotkeys. Unknown actions and unparsable
/// key names are skipped with a warning.
pub fn resolve_bindings(table: &HashMap<String, HotkeyConfig>) -> Vec<(TransportHotkey, HotKey)> {
    let mut bindings = Vec::new();
    for hotkey in TransportHotkey::ALL {
        let Some(config) = table.get(hotkey.config_key()) else {
            continue;
        };
        match config.to_global_hotkey() {
            Ok((modifiers, code)) => bindings.push((hotkey, HotKey::new(modifiers, code))),
            Err(e) => log::warn!("Skipping hotkey '{}': {}", hotkey.config_key(), e),
        }
    }

    for name in table.keys() {
        if TransportHotkey::from_config_key(name).is_none() {
            log::warn!("Ignoring unknown hotkey action '{}'", name);
        }
    }
    bindings
}

pub struct HotkeyManager {
    _manager: GlobalHotKeyManager, // Keep registrations alive
    bindings: HashMap<u32, TransportHotkey>,
}

impl HotkeyManager {
    /// Register every binding from the config. Must run on the main thread.
    pub fn new(table: &HashMap<String, HotkeyConfig>) -> anyhow::Result<Self> {
        let manager = GlobalHotKeyManager::new()
            .map_err(|e| anyhow::anyhow!("Failed to create hotkey manager: {}", e))?;

        let mut bindings = HashMap::new();
        for (action, hotkey) in resolve_bindings(table) {
            match manager.register(hotkey) {
                Ok(()) => {
                    log::info!("Registered hotkey for {:?}", action);
                    bindings.insert(hotkey.id(), action);
                }
                Err(e) => log::warn!("Failed to register hotkey for {:?}: {}", action, e),
            }
        }

        Ok(HotkeyManager {
            _manager: manager,
            bindings,
        })
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Forward pressed hotkeys into the command channel from a background
    /// thread. Ends once the channel has closed.
    pub fn spawn_forwarder(&self, sender: CommandSender) -> anyhow::Result<JoinHandle<()>> {
        let bindings = self.bindings.clone();
        thread::Builder::new()
            .name("hotkey-forwarder".to_string())
            .spawn(move || {
                let receiver = GlobalHotKeyEvent::receiver();
                while let Ok(event) = receiver.recv() {
                    if event.state != HotKeyState::Pressed {
                        continue;
                    }
                    let Some(action) = bindings.get(&event.id) else {
                        continue;
                    };
                    log::debug!("Hotkey pressed: {:?}", action);
                    if sender.send(action.to_command()).is_err() {
                        break;
                    }
                }
                log::debug!("Hotkey forwarder stopped");
            })
            .map_err(|e| anyhow::anyhow!("Failed to start hotkey thread: {}", e))
    }
}
