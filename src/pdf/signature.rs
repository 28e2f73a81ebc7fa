// src/pdf/signature.rs
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, GenericImageView, RgbImage};

/// Estado da assinatura depois de tentar descodificar o campo.
#[derive(Debug, Clone)]
pub enum Signature {
    Missing,
    Invalid,
    Image(DynamicImage),
}

/// Descodifica uma data URL (`data:image/png;base64,...`) ou base64 puro.
/// Qualquer falha resulta em `Signature::Invalid`, nunca em erro.
pub fn decode_signature(raw: &str) -> Signature {
    let raw = raw.trim();
    if raw.is_empty() {
        return Signature::Missing;
    }

    let payload = match raw.strip_prefix("data:") {
        Some(rest) => match rest.split_once(',') {
            Some((header, data)) if header.ends_with(";base64") => data,
            _ => {
                tracing::warn!("Assinatura com data URL sem base64, ignorada.");
                return Signature::Invalid;
            }
        },
        None => raw,
    };
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();

    let bytes = match STANDARD.decode(compact.as_bytes()) {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!("Assinatura com base64 inválido: {}", e);
            return Signature::Invalid;
        }
    };
    match image::load_from_memory(&bytes) {
        Ok(img) if img.width() > 0 && img.height() > 0 => Signature::Image(flatten_on_white(&img)),
        Ok(_) => Signature::Invalid,
        Err(e) => {
            tracing::warn!("Assinatura não é uma imagem legível: {}", e);
            Signature::Invalid
        }
    }
}

// O canvas do formulário gera PNG com fundo transparente
fn flatten_on_white(img: &DynamicImage) -> DynamicImage {
    let rgba = img.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, px) in rgba.enumerate_pixels() {
        let alpha = px[3] as f32 / 255.0;
        let blend = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        out.put_pixel(x, y, image::Rgb([blend(px[0]), blend(px[1]), blend(px[2])]));
    }
    DynamicImage::ImageRgb8(out)
}

/// Tamanho de desenho em pontos (1 px = 1 pt), reduzido para caber em
/// `max_width` x `max_height` mantendo a proporção. Nunca amplia.
pub fn fit_size(px_width: u32, px_height: u32, max_width: f32, max_height: f32) -> (f32, f32) {
    let (w, h) = (px_width as f32, px_height as f32);
    if w <= 0.0 || h <= 0.0 {
        return (0.0, 0.0);
    }
    let scale = (max_width / w).min(max_height / h).min(1.0);
    (w * scale, h * scale)
}

/// PNG RGBA gerado em memória, como o canvas do formulário envia.
#[cfg(test)]
pub fn png_data_url(width: u32, height: u32) -> String {
    let img = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
        width,
        height,
        image::Rgba([20, 20, 90, 255]),
    ));
    let mut bytes = std::io::Cursor::new(Vec::new());
    img.write_to(&mut bytes, image::ImageOutputFormat::Png)
        .expect("png em memória");
    format!("data:image/png;base64,{}", STANDARD.encode(bytes.into_inner()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_data_url_and_bare_base64() {
        let url = png_data_url(3, 2);
        match decode_signature(&url) {
            Signature::Image(img) => assert_eq!(img.dimensions(), (3, 2)),
            other => panic!("esperava imagem, veio {:?}", other),
        }
        let bare = url.trim_start_matches("data:image/png;base64,");
        assert!(matches!(decode_signature(bare), Signature::Image(_)));
    }

    #[test]
    fn bad_input_degrades_instead_of_failing() {
        assert!(matches!(decode_signature(""), Signature::Missing));
        assert!(matches!(decode_signature("   "), Signature::Missing));
        assert!(matches!(decode_signature("data:image/png;base64,@@@"), Signature::Invalid));
        assert!(matches!(decode_signature("data:text/plain,ola"), Signature::Invalid));
        // base64 válido mas não é imagem
        assert!(matches!(decode_signature("data:image/png;base64,b2zDoQ=="), Signature::Invalid));
    }

    #[test]
    fn transparent_pixels_become_white() {
        let mut rgba = image::RgbaImage::new(2, 1);
        rgba.put_pixel(0, 0, image::Rgba([0, 0, 0, 0]));
        rgba.put_pixel(1, 0, image::Rgba([0, 0, 0, 255]));
        let flat = flatten_on_white(&DynamicImage::ImageRgba8(rgba)).to_rgb8();
        assert_eq!(flat.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(flat.get_pixel(1, 0).0, [0, 0, 0]);
    }

    #[test]
    fn fit_size_only_shrinks() {
        assert_eq!(fit_size(100, 50, 220.0, 160.0), (100.0, 50.0));
        let (w, h) = fit_size(880, 200, 220.0, 160.0);
        assert!((w - 220.0).abs() < 0.01);
        assert!((h - 50.0).abs() < 0.01);
        let (w, h) = fit_size(100, 800, 220.0, 160.0);
        assert!((h - 160.0).abs() < 0.01);
        assert!((w - 20.0).abs() < 0.01);
        assert_eq!(fit_size(0, 10, 220.0, 160.0), (0.0, 0.0));
    }
}
