//! 스크린샷 인코딩.
//!
//! 최대 크기에 맞춘 비율 유지 축소(fast_image_resize) 후 JPEG 인코딩.

use fast_image_resize::{images::Image as FirImage, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};
use tracing::debug;
use worktrack_core::error::CoreError;
use worktrack_core::models::capture::CapturedFrame;

/// 인코딩된 이미지
#[derive(Debug, Clone)]
pub struct EncodedImage {
    /// JPEG 바이트
    pub bytes: Vec<u8>,
    /// 최종 너비
    pub width: u32,
    /// 최종 높이
    pub height: u32,
}

/// 최대 너비/높이 안에 들어가는 크기 계산 (0은 제한 없음)
///
/// 너비를 먼저 맞추고, 그래도 높이가 넘치면 원본 기준으로 높이에 맞춘다.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let (w, h) = (width as u64, height as u64);
    let (mut sw, mut sh) = (w, h);

    if max_width > 0 && w > max_width as u64 {
        sw = max_width as u64;
        sh = h * max_width as u64 / w;
    }
    if max_height > 0 && sh > max_height as u64 {
        sh = max_height as u64;
        sw = w * max_height as u64 / h;
    }

    (sw.max(1) as u32, sh.max(1) as u32)
}

/// RGBA 버퍼 리사이즈
pub fn resize_rgba(
    rgba: Vec<u8>,
    width: u32,
    height: u32,
    target_width: u32,
    target_height: u32,
) -> Result<Vec<u8>, CoreError> {
    if width == 0 || height == 0 {
        return Err(CoreError::Internal("소스 이미지 크기 0".to_string()));
    }

    let src = FirImage::from_vec_u8(width, height, rgba, PixelType::U8x4)
        .map_err(|e| CoreError::Internal(format!("소스 이미지 생성 실패: {e}")))?;
    let mut dst = FirImage::new(target_width, target_height, PixelType::U8x4);

    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(
        fast_image_resize::FilterType::Lanczos3,
    ));
    Resizer::new()
        .resize(&src, &mut dst, &options)
        .map_err(|e| CoreError::Internal(format!("리사이즈 실패: {e}")))?;

    Ok(dst.into_vec())
}

/// 프레임 → JPEG (필요 시 축소)
pub fn encode_jpeg(
    frame: CapturedFrame,
    quality: u8,
    max_width: u32,
    max_height: u32,
) -> Result<EncodedImage, CoreError> {
    let (width, height) = (frame.width(), frame.height());
    let (target_w, target_h) = fit_within(width, height, max_width, max_height);

    let rgba = if (target_w, target_h) != (width, height) {
        debug!("이미지 축소: {width}x{height} → {target_w}x{target_h}");
        resize_rgba(frame.rgba, width, height, target_w, target_h)?
    } else {
        frame.rgba
    };

    let image = RgbaImage::from_raw(target_w, target_h, rgba)
        .ok_or_else(|| CoreError::Internal("이미지 버퍼 크기 불일치".to_string()))?;
    // JPEG은 알파 채널을 지원하지 않는다
    let rgb = DynamicImage::ImageRgba8(image).to_rgb8();

    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100))
        .encode_image(&rgb)
        .map_err(|e| CoreError::Internal(format!("JPEG 인코딩 실패: {e}")))?;

    Ok(EncodedImage {
        bytes,
        width: target_w,
        height: target_h,
    })
}
