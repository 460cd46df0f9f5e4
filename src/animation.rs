//! Looping decorative animation.
//!
//! Assets are GIF files looked up by base name in the assets directory. A
//! missing or unreadable asset leaves the picture empty.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use glib::{timeout_add_local_once, WeakRef};
use gtk4::gdk_pixbuf::{prelude::*, PixbufAnimation, PixbufAnimationIter};
use gtk4::{gdk, prelude::*, Picture};
use log::debug;

const EXTENSIONS: [&str; 2] = ["gif", "png"];
const MIN_FRAME_DELAY: Duration = Duration::from_millis(20);

/// Finds `<dir>/<name>.<ext>` for the supported extensions.
pub fn resolve(dir: &Path, name: &str) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }
    EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{name}.{ext}")))
        .find(|path| path.is_file())
}

pub fn load(path: &Path) -> Option<PixbufAnimation> {
    match PixbufAnimation::from_file(path) {
        Ok(animation) => Some(animation),
        Err(err) => {
            debug!("could not decode {:?}: {}", path, err);
            None
        }
    }
}

/// Builds a picture of `size`×`size` playing the named asset in a loop.
pub fn picture(dir: &Path, name: &str, size: i32) -> Picture {
    let picture = Picture::new();
    picture.set_size_request(size, size);
    picture.set_can_shrink(true);
    picture.add_css_class("popup-image");

    match resolve(dir, name).and_then(|path| load(&path)) {
        Some(animation) => play(&picture, &animation),
        None => debug!("no asset named {:?} in {:?}", name, dir),
    }
    picture
}

fn play(picture: &Picture, animation: &PixbufAnimation) {
    if animation.is_static_image() {
        if let Some(pixbuf) = animation.static_image() {
            picture.set_paintable(Some(&gdk::Texture::for_pixbuf(&pixbuf)));
        }
        return;
    }
    let frames = animation.iter(Some(SystemTime::now()));
    picture.set_paintable(Some(&gdk::Texture::for_pixbuf(&frames.pixbuf())));
    schedule_frame(picture.downgrade(), frames);
}

fn schedule_frame(picture: WeakRef<Picture>, frames: PixbufAnimationIter) {
    // None means the current frame is shown forever.
    let Some(delay) = frames.delay_time() else {
        return;
    };
    timeout_add_local_once(delay.max(MIN_FRAME_DELAY), move || {
        let Some(strong) = picture.upgrade() else {
            return;
        };
        if frames.advance(SystemTime::now()) {
            strong.set_paintable(Some(&gdk::Texture::for_pixbuf(&frames.pixbuf())));
        }
        schedule_frame(picture, frames);
    });
}
