//! Hint-only sniffers for bitmap images and audio files. Their content is
//! left to the system MIME table.

use super::hinted;
use crate::hints::Hints;
use crate::media_type::MediaType;
use crate::sniffer::Sniffer;

struct KnownType {
    media_type: MediaType,
    extensions: &'static [&'static str],
    media_types: &'static [&'static str],
}

impl KnownType {
    const fn new(
        media_type: MediaType,
        extensions: &'static [&'static str],
        media_types: &'static [&'static str],
    ) -> Self {
        Self {
            media_type,
            extensions,
            media_types,
        }
    }
}

fn sniff_known(known: &[KnownType], hints: &Hints) -> Option<MediaType> {
    known
        .iter()
        .find(|k| hinted(hints, k.extensions, k.media_types))
        .map(|k| k.media_type.clone())
}

const BITMAPS: &[KnownType] = &[
    KnownType::new(MediaType::AVIF, &["avif"], &["image/avif"]),
    KnownType::new(MediaType::BMP, &["bmp", "dib"], &["image/bmp", "image/x-bmp"]),
    KnownType::new(MediaType::GIF, &["gif"], &["image/gif"]),
    KnownType::new(
        MediaType::JPEG,
        &["jpg", "jpeg", "jpe", "jif", "jfif", "jfi"],
        &["image/jpeg"],
    ),
    KnownType::new(MediaType::JXL, &["jxl"], &["image/jxl"]),
    KnownType::new(MediaType::PNG, &["png"], &["image/png"]),
    KnownType::new(MediaType::TIFF, &["tiff", "tif"], &["image/tiff", "image/tiff-fx"]),
    KnownType::new(MediaType::WEBP, &["webp"], &["image/webp"]),
];

const AUDIO: &[KnownType] = &[
    KnownType::new(MediaType::AAC, &["aac"], &["audio/aac"]),
    KnownType::new(MediaType::AIFF, &["aiff", "aif"], &["audio/aiff", "audio/x-aiff"]),
    KnownType::new(MediaType::FLAC, &["flac"], &["audio/flac"]),
    KnownType::new(
        MediaType::MP4_AUDIO,
        &["m4a", "m4b", "alac"],
        &["audio/mp4", "audio/x-m4a"],
    ),
    KnownType::new(MediaType::MP3, &["mp3"], &["audio/mpeg", "audio/mp3"]),
    KnownType::new(MediaType::OGG, &["ogg", "oga"], &["audio/ogg"]),
    KnownType::new(MediaType::OPUS, &["opus"], &["audio/opus"]),
    KnownType::new(MediaType::WAV, &["wav"], &["audio/wav", "audio/x-wav"]),
    KnownType::new(MediaType::WEBM_AUDIO, &["weba"], &["audio/webm"]),
];

/// Bitmap images.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitmapSniffer;

impl Sniffer for BitmapSniffer {
    fn name(&self) -> &'static str {
        "bitmap"
    }

    fn sniff_hints(&self, hints: &Hints) -> Option<MediaType> {
        sniff_known(BITMAPS, hints)
    }
}

/// Audio files, as found in the reading order of audiobooks.
#[derive(Debug, Clone, Copy, Default)]
pub struct AudioSniffer;

impl Sniffer for AudioSniffer {
    fn name(&self) -> &'static str {
        "audio"
    }

    fn sniff_hints(&self, hints: &Hints) -> Option<MediaType> {
        sniff_known(AUDIO, hints)
    }
}
