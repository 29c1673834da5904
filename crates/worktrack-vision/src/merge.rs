//! 다중 화면 병합.
//!
//! 모든 화면 영역을 감싸는 바운딩 박스 캔버스를 만들고,
//! 각 프레임을 최소 좌표 기준 오프셋에 복사한다. 빈 영역은 투명 검정으로 남는다.

use tracing::debug;
use worktrack_core::error::CoreError;
use worktrack_core::models::capture::{CaptureSource, CapturedFrame, ScreenBounds};

/// 병합 배치 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeLayout {
    /// 가상 데스크톱 좌표계의 캔버스 영역
    pub canvas: ScreenBounds,
    /// 입력 순서대로의 캔버스 내 오프셋
    pub offsets: Vec<(u32, u32)>,
}

/// 바운딩 박스와 화면별 오프셋 계산 (입력이 비면 None)
pub fn merge_layout(bounds: &[ScreenBounds]) -> Option<MergeLayout> {
    let first = bounds.first()?;
    let (mut min_x, mut min_y) = (first.x, first.y);
    let (mut max_x, mut max_y) = (first.right(), first.bottom());

    for b in &bounds[1..] {
        min_x = min_x.min(b.x);
        min_y = min_y.min(b.y);
        max_x = max_x.max(b.right());
        max_y = max_y.max(b.bottom());
    }

    let offsets = bounds
        .iter()
        .map(|b| ((b.x - min_x) as u32, (b.y - min_y) as u32))
        .collect();

    Some(MergeLayout {
        canvas: ScreenBounds {
            x: min_x,
            y: min_y,
            width: (max_x - min_x) as u32,
            height: (max_y - min_y) as u32,
        },
        offsets,
    })
}

/// 프레임들을 한 장의 병합 프레임으로 합성
pub fn compose(frames: &[CapturedFrame]) -> Result<CapturedFrame, CoreError> {
    let bounds: Vec<ScreenBounds> = frames.iter().map(|f| f.bounds).collect();
    let layout = merge_layout(&bounds)
        .ok_or_else(|| CoreError::NoData("병합할 프레임 없음".to_string()))?;

    let canvas_w = layout.canvas.width as usize;
    let canvas_h = layout.canvas.height as usize;
    let mut canvas = vec![0u8; canvas_w * canvas_h * 4];

    for (frame, &(ox, oy)) in frames.iter().zip(&layout.offsets) {
        let (w, h) = (frame.width() as usize, frame.height() as usize);
        if frame.rgba.len() != w * h * 4 {
            return Err(CoreError::Validation {
                field: "rgba".to_string(),
                message: format!(
                    "{:?} 픽셀 길이 불일치: {} != {}x{}x4",
                    frame.source,
                    frame.rgba.len(),
                    w,
                    h
                ),
            });
        }

        let row_bytes = w * 4;
        for y in 0..h {
            let src = y * row_bytes;
            let dst = ((oy as usize + y) * canvas_w + ox as usize) * 4;
            canvas[dst..dst + row_bytes].copy_from_slice(&frame.rgba[src..src + row_bytes]);
        }
        debug!("화면 병합: {:?} 위치 ({ox}, {oy})", frame.source);
    }

    Ok(CapturedFrame {
        source: CaptureSource::Merged,
        bounds: layout.canvas,
        rgba: canvas,
    })
}
