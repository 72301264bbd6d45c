mod audio;
mod backend;
mod cli;
mod core;
mod gui;
mod hotkeys;
mod remote;
mod video;

use clap::Parser;
use eframe::egui;
use crate::audio::OutputDeviceManager;
use crate::cli::Args;
use crate::core::{command_channel, AppConfig, CommandSender, MediaSelection};
use crate::gui::{RfdFileSelector, SyncPlayerApp};
use crate::hotkeys::HotkeyManager;

fn list_audio_devices() -> anyhow::Result<()> {
    for device in OutputDeviceManager::new().devices()? {
        println!("{}", device);
    }
    Ok(())
}

/// Start every configured command producer. Returns the hotkey registrations,
/// which must stay alive on the main thread.
fn start_feeds(config: &AppConfig, sender: &CommandSender) -> anyhow::Result<Option<HotkeyManager>> {
    if config.stdin_commands {
        remote::spawn_stdin_feed(sender.clone())?;
    }

    if let Some(address) = &config.listen_address {
        remote::spawn_tcp_feed(address, sender.clone())?;
    }

    if !config.hotkeys_enabled {
        return Ok(None);
    }
    match HotkeyManager::new(&config.hotkeys) {
        Ok(manager) if manager.is_empty() => {
            log::warn!("Hotkeys enabled but none could be registered");
            Ok(None)
        }
        Ok(manager) => {
            manager.spawn_forwarder(sender.clone())?;
            log::info!("{} transport hotkeys active", manager.len());
            Ok(Some(manager))
        }
        Err(e) => {
            log::warn!("Global hotkeys unavailable: {}", e);
            Ok(None)
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.list_audio_devices {
        return list_audio_devices();
    }

    let mut config = match &args.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    args.apply_to(&mut config);

    let selection = MediaSelection::prompt(
        &mut RfdFileSelector,
        args.video.clone(),
        args.audio.clone(),
        config.last_video_directory.as_deref(),
        config.last_audio_directory.as_deref(),
    );
    let (Some(video_path), Some(audio_path)) = (&selection.video, &selection.audio) else {
        log::info!("Media selection cancelled, nothing to play");
        return Ok(());
    };

    config.remember_directories(video_path, audio_path);
    let saved = match &args.config {
        Some(path) => config.save_to(path),
        None => config.save(),
    };
    if let Err(e) = saved {
        log::warn!("Failed to save config: {}", e);
    }

    let (sender, receiver) = command_channel();
    let hotkeys = start_feeds(&config, &sender)?;
    drop(sender);

    let mut viewport = egui::ViewportBuilder::default()
        .with_inner_size(config.window_size)
        .with_title("Sync Player");
    if config.always_on_top {
        viewport = viewport.with_window_level(egui::viewport::WindowLevel::AlwaysOnTop);
    }
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "Sync Player",
        options,
        Box::new(move |cc| {
            match SyncPlayerApp::new(cc, &config, selection, receiver, hotkeys) {
                Ok(app) => Ok(Box::new(app)),
                Err(e) => {
                    log::error!("Failed to load media: {}", e);
                    eprintln!("Failed to load media: {}", e);
                    std::process::exit(1);
                }
            }
        }),
    ).map_err(|e| anyhow::anyhow!("Failed to run app: {}", e))?;

    Ok(())
}
