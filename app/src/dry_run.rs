//! Scripted pages for `run --dry-run`.
//!
//! Each page is signed in, online and empty, so a dry run walks the wizard
//! and every job without touching a real account.

use cinder_browser::FakeSurface;
use cinder_core::PlatformKind;
use serde_json::json;
use std::sync::Arc;

pub const DRY_RUN_USERNAME: &str = "dry-run";

pub fn surface(platform: PlatformKind) -> Arc<FakeSurface> {
    match platform {
        PlatformKind::X => x_surface(),
        PlatformKind::Facebook => facebook_surface(),
    }
}

fn x_surface() -> Arc<FakeSurface> {
    let surface = Arc::new(FakeSurface::new("https://x.com/home"));
    surface.respond("navigator.onLine", json!(true));
    surface.redirect("https://x.com/login", "https://x.com/home");
    surface.respond("AppTabBar_Profile_Link", json!(true));
    surface.respond("getAttribute", json!(format!("/{DRY_RUN_USERNAME}")));
    surface.respond("primaryColumn", json!(true));
    surface.respond("socialContext", json!([]));
    surface.respond("-unfollow", json!([]));
    surface.respond("document.cookie", json!(DRY_RUN_USERNAME));
    surface
}

fn facebook_surface() -> Arc<FakeSurface> {
    let surface = Arc::new(FakeSurface::new("https://www.facebook.com/"));
    surface.respond("navigator.onLine", json!(true));
    surface.respond("banner", json!(true));
    surface.respond("documentElement.lang", json!("en"));
    surface.respond("document.evaluate", json!(true));
    surface.respond("!== null", json!(true));
    surface.respond("aria-checked", json!(0));
    surface
}
