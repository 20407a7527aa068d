use crate::assets::decode::DecodedFrame;
use crate::foundation::core::RoundedRect;
use crate::foundation::error::{SeqError, SeqResult};
use crate::render::placement::Placement;

/// Readback of the drawing surface.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Premultiplied RGBA8 of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Convert to straight alpha in place, e.g. before encoding to PNG.
    pub fn unpremultiply(&mut self) {
        if !self.premultiplied {
            return;
        }
        for px in self.data.chunks_exact_mut(4) {
            let a = u16::from(px[3]);
            if a == 0 || a == 255 {
                continue;
            }
            for c in &mut px[..3] {
                *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        self.premultiplied = false;
    }
}

/// Which drawing backend to create.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// 2D raster surface on the CPU.
    #[default]
    Raster,
    /// Hardware-accelerated surface. Requires the `gpu` feature.
    Gpu,
}

#[derive(Clone, Debug, Default)]
pub struct RenderSettings {
    /// Straight RGBA8 painted behind each frame. Transparent when unset.
    pub clear_rgba: Option<[u8; 4]>,
}

/// One frame to draw. All geometry is in surface pixels.
pub struct PaintRequest<'a> {
    pub frame: &'a DecodedFrame,
    pub placement: Placement,
    pub clip: Option<RoundedRect>,
}

/// A drawing surface that can paint one decoded frame at a time.
///
/// Backends must not retain `frame` beyond `paint`; GPU backends release the upload texture before
/// returning.
pub trait FrameBackend {
    fn size(&self) -> (u32, u32);

    /// Reallocate the surface. Contents are cleared.
    fn resize(&mut self, width: u32, height: u32) -> SeqResult<()>;

    /// Clear and draw `req.frame` at its placement.
    fn paint(&mut self, req: PaintRequest<'_>) -> SeqResult<()>;

    fn clear(&mut self) -> SeqResult<()>;

    fn snapshot(&mut self) -> SeqResult<FrameRGBA>;

    /// GPU textures currently allocated for frame uploads.
    fn live_textures(&self) -> usize {
        0
    }
}

pub fn create_backend(
    kind: BackendKind,
    settings: &RenderSettings,
    width: u32,
    height: u32,
) -> SeqResult<Box<dyn FrameBackend>> {
    match kind {
        BackendKind::Raster => Ok(Box::new(crate::render::cpu::RasterBackend::new(
            settings.clone(),
            width,
            height,
        )?)),
        #[cfg(feature = "gpu")]
        BackendKind::Gpu => Ok(Box::new(crate::render::gpu::GpuBackend::new(
            settings.clone(),
            width,
            height,
        )?)),
        #[cfg(not(feature = "gpu"))]
        BackendKind::Gpu => Err(SeqError::backend(
            "gpu backend requested but the `gpu` feature is disabled",
        )),
    }
}

pub(crate) fn premul_clear(settings: &RenderSettings) -> [u8; 4] {
    settings
        .clear_rgba
        .map(|[r, g, b, a]| crate::foundation::core::Rgba8Premul::from_straight_rgba(r, g, b, a))
        .map(|c| c.to_array())
        .unwrap_or([0, 0, 0, 0])
}

pub(crate) fn surface_dims(width: u32, height: u32) -> SeqResult<(u16, u16)> {
    let w: u16 = width
        .try_into()
        .map_err(|_| SeqError::backend("surface width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| SeqError::backend("surface height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(SeqError::backend("surface must be at least 1x1"));
    }
    Ok((w, h))
}
