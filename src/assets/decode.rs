use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::{ColorType, ImageDecoder as _};

use crate::assets::loader::Blob;
use crate::foundation::error::{SeqError, SeqResult};

/// A fully decoded frame in premultiplied RGBA8.
///
/// The pixels live in a single buffer that backends share by reference count, so painting never
/// copies them. Frames are deliberately not `Clone`: each one counts against the decoded-image
/// budget until it is dropped.
#[derive(Debug)]
pub struct DecodedFrame {
    pub width: u32,
    pub height: u32,
    pixels: Arc<vello_cpu::Pixmap>,
    _live: LiveGuard,
}

impl DecodedFrame {
    /// Row-major premultiplied RGBA8.
    pub fn data(&self) -> &[u8] {
        self.pixels.data_as_u8_slice()
    }

    /// Size of the pixel buffer in bytes.
    pub fn byte_len(&self) -> usize {
        self.data().len()
    }

    pub(crate) fn pixmap(&self) -> Arc<vello_cpu::Pixmap> {
        Arc::clone(&self.pixels)
    }
}

/// Counts decoded frames alive at once and remembers the peak.
#[derive(Clone, Debug, Default)]
pub(crate) struct LiveCounter(Arc<LiveInner>);

#[derive(Debug, Default)]
struct LiveInner {
    live: AtomicUsize,
    peak: AtomicUsize,
}

impl LiveCounter {
    fn enter(&self) -> LiveGuard {
        let now = self.0.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.0.peak.fetch_max(now, Ordering::SeqCst);
        LiveGuard(self.clone())
    }

    pub(crate) fn live(&self) -> usize {
        self.0.live.load(Ordering::SeqCst)
    }

    pub(crate) fn peak(&self) -> usize {
        self.0.peak.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
struct LiveGuard(LiveCounter);

impl Drop for LiveGuard {
    fn drop(&mut self) {
        (self.0).0.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Decode encoded bytes straight into a premultiplied pixmap.
///
/// 8-bit gray, gray-alpha, RGB and RGBA sources are read into the final buffer and widened in
/// place. Other sample formats go through one intermediate RGBA8 conversion.
pub(crate) fn decode_pixmap(bytes: &[u8]) -> SeqResult<(u32, u32, vello_cpu::Pixmap)> {
    let decoder = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| SeqError::decode(format!("guess image format: {e}")))?
        .into_decoder()
        .map_err(|e| SeqError::decode(format!("open image decoder: {e}")))?;
    let (width, height) = decoder.dimensions();
    let (w, h) = pixmap_dims(width, height)?;
    let color = decoder.color_type();

    let mut pixmap = vello_cpu::Pixmap::new(w, h);
    let buf = pixmap.data_as_u8_slice_mut();
    let n = width as usize * height as usize;
    match color {
        ColorType::Rgba8 | ColorType::Rgb8 | ColorType::La8 | ColorType::L8 => {
            let channels = usize::from(color.channel_count());
            decoder
                .read_image(&mut buf[..n * channels])
                .map_err(|e| SeqError::decode(format!("decode image: {e}")))?;
            widen_to_rgba8_in_place(buf, n, channels);
        }
        _ => {
            tracing::trace!(?color, "decoding through an intermediate rgba8 buffer");
            let rgba = image::DynamicImage::from_decoder(decoder)
                .map_err(|e| SeqError::decode(format!("decode image: {e}")))?
                .into_rgba8();
            buf.copy_from_slice(rgba.as_raw());
        }
    }

    let translucent = premultiply_rgba8_in_place(buf);
    pixmap.set_may_have_opacities(translucent);
    Ok((width, height, pixmap))
}

fn pixmap_dims(width: u32, height: u32) -> SeqResult<(u16, u16)> {
    match (u16::try_from(width), u16::try_from(height)) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => Ok((w, h)),
        _ => Err(SeqError::decode(format!(
            "unsupported image size {width}x{height}"
        ))),
    }
}

/// Expand `n` packed pixels of `channels` bytes each at the front of `buf` into RGBA8.
///
/// Walks backwards so every write lands at or after the bytes still to be read.
pub(crate) fn widen_to_rgba8_in_place(buf: &mut [u8], n: usize, channels: usize) {
    if channels == 4 {
        return;
    }
    for i in (0..n).rev() {
        let src = i * channels;
        let (r, g, b, a) = match channels {
            1 => (buf[src], buf[src], buf[src], 255),
            2 => (buf[src], buf[src], buf[src], buf[src + 1]),
            _ => (buf[src], buf[src + 1], buf[src + 2], 255),
        };
        let dst = i * 4;
        buf[dst..dst + 4].copy_from_slice(&[r, g, b, a]);
    }
}

/// Read natural dimensions from the image header without decoding pixels.
pub fn read_dimensions(bytes: &[u8]) -> SeqResult<(u32, u32)> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| SeqError::decode(format!("guess image format: {e}")))?
        .into_dimensions()
        .map_err(|e| SeqError::decode(format!("read image dimensions: {e}")))
}

/// Owner of the single transient decode handle.
///
/// Acquiring a handle revokes the previous one first, and the returned guard revokes itself when
/// dropped, so a handle never outlives the decode it was created for, including on failure.
#[derive(Debug, Default)]
pub struct DecodeSlot {
    live: LiveCounter,
    open: Option<String>,
    acquired: u64,
    revoked: u64,
}

impl DecodeSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the transient handle for `source`.
    pub fn acquire(&mut self, source: &str, bytes: Blob) -> TransientHandle<'_> {
        if self.open.take().is_some() {
            self.revoked += 1;
        }
        self.open = Some(source.to_owned());
        self.acquired += 1;
        TransientHandle { slot: self, bytes }
    }

    /// Source of the currently open handle, if any.
    pub fn open_handle(&self) -> Option<&str> {
        self.open.as_deref()
    }

    pub fn acquired(&self) -> u64 {
        self.acquired
    }

    pub fn revoked(&self) -> u64 {
        self.revoked
    }

    /// Decoded frames alive right now.
    pub fn live_decoded(&self) -> usize {
        self.live.live()
    }

    /// Largest number of decoded frames ever alive at once.
    pub fn peak_decoded(&self) -> usize {
        self.live.peak()
    }

    fn revoke(&mut self) {
        if self.open.take().is_some() {
            self.revoked += 1;
        }
    }
}

/// Short-lived handle over cached bytes, valid for exactly one decode.
pub struct TransientHandle<'a> {
    slot: &'a mut DecodeSlot,
    bytes: Blob,
}

impl TransientHandle<'_> {
    /// Decode and revoke the handle in the same step.
    pub fn decode(self) -> SeqResult<DecodedFrame> {
        let (width, height, pixmap) = decode_pixmap(&self.bytes)?;
        let live = self.slot.live.enter();
        Ok(DecodedFrame {
            width,
            height,
            pixels: Arc::new(pixmap),
            _live: live,
        })
    }
}

impl Drop for TransientHandle<'_> {
    fn drop(&mut self) {
        self.slot.revoke();
    }
}

/// Premultiply in place. Returns `true` if any pixel is not fully opaque.
pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) -> bool {
    let mut translucent = false;
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 255 {
            continue;
        }
        translucent = true;
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * a + 127) / 255) as u8;
        }
    }
    translucent
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
