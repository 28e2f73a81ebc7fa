// src/pdf/writer.rs
//
// Converte o `Layout` em bytes PDF com o printpdf.
use super::layout::{rounded_rect_points, DrawOp, Layout, PAGE_HEIGHT, PAGE_WIDTH};
use super::metrics::Font;
use image::GenericImageView;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfLayerReference, Point, Rgb,
};

fn mm(pt: f32) -> Mm {
    Mm(pt * 25.4 / 72.0)
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Fonts {
    fn get(&self, font: Font) -> &IndirectFontRef {
        match font {
            Font::Regular => &self.regular,
            Font::Bold => &self.bold,
        }
    }
}

pub fn write_pdf(title: &str, layout: &Layout) -> Result<Vec<u8>, String> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(title, mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Camada 1");
    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| e.to_string())?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| e.to_string())?,
    };

    for (i, page) in layout.pages.iter().enumerate() {
        let (page_idx, layer_idx) = if i == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Camada 1")
        };
        let layer = doc.get_page(page_idx).get_layer(layer_idx);
        layer.set_outline_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));

        for op in &page.ops {
            draw(&layer, &fonts, op);
        }
    }

    doc.save_to_bytes().map_err(|e| e.to_string())
}

fn draw(layer: &PdfLayerReference, fonts: &Fonts, op: &DrawOp) {
    match op {
        DrawOp::Text { x, y, size, font, text } => {
            layer.use_text(text.as_str(), *size, mm(*x), mm(*y), fonts.get(*font));
        }
        DrawOp::Line { x1, y1, x2, y2, thickness } => {
            layer.set_outline_thickness(*thickness);
            layer.add_line(Line {
                points: vec![
                    (Point::new(mm(*x1), mm(*y1)), false),
                    (Point::new(mm(*x2), mm(*y2)), false),
                ],
                is_closed: false,
            });
        }
        DrawOp::RoundedRect { x, y, width, height, radius } => {
            layer.set_outline_thickness(1.2);
            let points = rounded_rect_points(*x, *y, *width, *height, *radius)
                .into_iter()
                .map(|(px, py)| (Point::new(mm(px), mm(py)), false))
                .collect();
            layer.add_line(Line {
                points,
                is_closed: true,
            });
        }
        DrawOp::Image { x, y, width, height, image } => {
            let (px_w, px_h) = image.dimensions();
            if px_w == 0 || px_h == 0 {
                return;
            }
            // A 72 dpi um pixel mede um ponto
            Image::from_dynamic_image(image).add_to_layer(
                layer.clone(),
                ImageTransform {
                    translate_x: Some(mm(*x)),
                    translate_y: Some(mm(*y)),
                    scale_x: Some(width / px_w as f32),
                    scale_y: Some(height / px_h as f32),
                    dpi: Some(72.0),
                    ..Default::default()
                },
            );
        }
    }
}
