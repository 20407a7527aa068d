use crate::foundation::core::{Affine, Point, RoundedRect};
use crate::foundation::error::SeqResult;
use crate::render::backend::{
    FrameBackend, FrameRGBA, PaintRequest, RenderSettings, premul_clear, surface_dims,
};

/// CPU raster surface backed by `vello_cpu`.
pub struct RasterBackend {
    settings: RenderSettings,
    width: u16,
    height: u16,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
}

impl RasterBackend {
    pub fn new(settings: RenderSettings, width: u32, height: u32) -> SeqResult<Self> {
        let (w, h) = surface_dims(width, height)?;
        let mut backend = Self {
            settings,
            width: w,
            height: h,
            ctx: vello_cpu::RenderContext::new(w, h),
            pixmap: vello_cpu::Pixmap::new(w, h),
        };
        backend.clear()?;
        Ok(backend)
    }
}

impl FrameBackend for RasterBackend {
    fn size(&self) -> (u32, u32) {
        (u32::from(self.width), u32::from(self.height))
    }

    fn resize(&mut self, width: u32, height: u32) -> SeqResult<()> {
        let (w, h) = surface_dims(width, height)?;
        if (w, h) != (self.width, self.height) {
            self.width = w;
            self.height = h;
            self.ctx = vello_cpu::RenderContext::new(w, h);
            self.pixmap = vello_cpu::Pixmap::new(w, h);
        }
        self.clear()
    }

    fn paint(&mut self, req: PaintRequest<'_>) -> SeqResult<()> {
        let frame = req.frame;
        let image = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(frame.pixmap()),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };

        clear_pixmap(&mut self.pixmap, premul_clear(&self.settings));

        let ctx = &mut self.ctx;
        ctx.reset();
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        if let Some([r, g, b, a]) = self.settings.clear_rgba
            && a > 0
        {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(self.width),
                f64::from(self.height),
            ));
        }

        if let Some(clip) = req.clip {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.push_clip_layer(&rounded_rect_to_cpu(clip));
        }

        ctx.set_transform(affine_to_cpu(req.placement.transform()));
        ctx.set_paint(image);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(frame.width),
            f64::from(frame.height),
        ));

        if req.clip.is_some() {
            ctx.pop_layer();
        }
        ctx.flush();
        ctx.render_to_pixmap(&mut self.pixmap);
        // Drop the paint so the uploaded pixmap does not outlive this call.
        ctx.reset();
        Ok(())
    }

    fn clear(&mut self) -> SeqResult<()> {
        clear_pixmap(&mut self.pixmap, premul_clear(&self.settings));
        Ok(())
    }

    fn snapshot(&mut self) -> SeqResult<FrameRGBA> {
        Ok(FrameRGBA {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: self.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap, rgba: [u8; 4]) {
    let data = pixmap.data_as_u8_slice_mut();
    for px in data.chunks_exact_mut(4) {
        px.copy_from_slice(&rgba);
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn rounded_rect_to_cpu(rr: RoundedRect) -> vello_cpu::kurbo::BezPath {
    use kurbo::{PathEl, Shape as _};

    let mut out = vello_cpu::kurbo::BezPath::new();
    for el in rr.path_elements(0.1) {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
