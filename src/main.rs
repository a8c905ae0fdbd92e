//! Ongaku debug tool
//!
//! Queries the player once through the scripting bridge and prints what
//! Ongaku would send to Discord. Doesn't connect to Discord.

use anyhow::Result;
use ongaku::presence::build_payload;
use ongaku::util::truncate;
use ongaku::{platform, IntegrationTarget, OsaScriptBridge, PlaybackState, PlayerBridge, TrackInfo};
use std::time::SystemTime;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    println!("🎵 Ongaku Player Inspector");
    println!("==========================\n");

    let target = IntegrationTarget::select();
    match platform::os_version() {
        Some((major, minor)) => println!("🖥️  {} {major}.{minor}", platform::name()),
        None => println!("🖥️  {} (version unknown)", platform::name()),
    }
    println!(
        "🎯 Target: {} ({}), art asset '{}'",
        target.display_name, target.application_identifier, target.image_asset_key
    );
    println!("📣 Notification: {}\n", target.notification_name());

    let bridge = OsaScriptBridge::new(target);
    if bridge.is_running() {
        println!("✅ {} is running!\n", target.display_name);
    } else {
        println!("⚠️  {} is not currently running.", target.display_name);
        println!("   Ongaku will show the idle status until it starts.\n");
    }

    println!("🔍 Bridge Results");
    println!("=================\n");

    let track = match bridge.current_track() {
        Ok(track) => track,
        Err(e) => {
            println!("   ❌ Track: {e:#}");
            None
        }
    };
    let state = match bridge.player_state() {
        Ok(state) => state,
        Err(e) => {
            println!("   ❌ State: {e:#}");
            None
        }
    };
    let position = match bridge.player_position() {
        Ok(position) => Some(position),
        Err(e) => {
            println!("   ❌ Position: {e:#}");
            None
        }
    };

    print_bridge(track.as_ref(), state, position);

    let fallback_position = track.as_ref().map_or(0.0, |t| t.position_seconds);
    let payload = build_payload(
        target,
        track.as_ref(),
        state,
        position.unwrap_or(fallback_position),
        SystemTime::now(),
    );

    println!("\n📝 For Discord Rich Presence:");
    println!("{}", serde_json::to_string_pretty(&payload)?);

    Ok(())
}

fn print_bridge(track: Option<&TrackInfo>, state: Option<PlaybackState>, position: Option<f64>) {
    println!("┌─────────────────────────────────────┐");
    println!("│ 🎵 Player State                     │");
    println!("├─────────────────────────────────────┤");

    let state = state.map_or_else(|| "(none)".to_string(), |s| format!("{s:?}"));
    println!("│ State:         {:20} │", state);

    match position {
        Some(position) => println!("│ Position:      {:>19.1}s │", position),
        None => println!("│ Position:      {:20} │", "(none)"),
    }

    match track {
        Some(track) => {
            println!("│ Track:         {:20} │", truncate(&track.name, 20));
            println!("│ Album:         {:20} │", truncate(&track.album, 20));
            println!("│ Artist:        {:20} │", truncate(&track.artist, 20));
            println!("│ Duration:      {:>19.1}s │", track.duration_seconds);
        }
        None => println!("│ Track:         {:20} │", "(nothing loaded)"),
    }

    println!("└─────────────────────────────────────┘");
}
