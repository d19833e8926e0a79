//! OpenCV-backed video file source.

use super::source::apply_seek;
use super::{Frame, FrameSource, SourceError, VideoInfo};
use image::RgbImage;
use opencv::{
    core::Mat,
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture},
};
use std::path::Path;

/// Decodes frames from a video file through OpenCV `videoio`.
pub struct VideoFile {
    capture: VideoCapture,
    info: VideoInfo,
    cursor: u64,
    bgr: Mat,
}

impl VideoFile {
    /// Opens the video and reads its properties.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let name = path.to_string_lossy();
        let capture = VideoCapture::from_file(&name, videoio::CAP_ANY)
            .map_err(|e| SourceError::OpenFailed(format!("{name}: {e}")))?;

        if !capture.is_opened().map_err(open_error(&name))? {
            return Err(SourceError::OpenFailed(format!("cannot open file: {name}")));
        }

        let fps = capture.get(videoio::CAP_PROP_FPS).map_err(open_error(&name))?;
        let frame_count = capture
            .get(videoio::CAP_PROP_FRAME_COUNT)
            .map_err(open_error(&name))?;
        let width = capture
            .get(videoio::CAP_PROP_FRAME_WIDTH)
            .map_err(open_error(&name))?;
        let height = capture
            .get(videoio::CAP_PROP_FRAME_HEIGHT)
            .map_err(open_error(&name))?;

        if fps <= 0.0 {
            return Err(SourceError::OpenFailed(format!(
                "{name}: container reports no frame rate"
            )));
        }

        let info = VideoInfo::new(fps, frame_count as u64, width as u32, height as u32);
        tracing::info!(
            path = %name,
            fps = info.fps,
            frames = info.frame_count,
            width = info.width,
            height = info.height,
            "Opened video"
        );

        Ok(Self {
            capture,
            info,
            cursor: 0,
            bgr: Mat::default(),
        })
    }

    fn to_frame(&self, index: u64) -> Result<Frame, SourceError> {
        let mut rgb = Mat::default();
        imgproc::cvt_color(&self.bgr, &mut rgb, imgproc::COLOR_BGR2RGB, 0)
            .map_err(|e| SourceError::DecodeFailed(e.to_string()))?;

        let width = rgb.cols() as u32;
        let height = rgb.rows() as u32;
        let bytes = rgb
            .data_bytes()
            .map_err(|e| SourceError::DecodeFailed(e.to_string()))?
            .to_vec();

        let image = RgbImage::from_raw(width, height, bytes).ok_or_else(|| {
            SourceError::DecodeFailed(format!("frame {index}: buffer does not match {width}x{height}"))
        })?;

        Ok(Frame::new(image, index, index as f64 / self.info.fps))
    }
}

impl FrameSource for VideoFile {
    fn info(&self) -> VideoInfo {
        self.info
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        if self.info.frame_count > 0 && self.cursor >= self.info.frame_count {
            return Ok(None);
        }

        let decoded = self
            .capture
            .read(&mut self.bgr)
            .map_err(|e| SourceError::DecodeFailed(e.to_string()))?;

        if !decoded || self.bgr.rows() == 0 {
            return Ok(None);
        }

        let frame = self.to_frame(self.cursor)?;
        self.cursor += 1;
        Ok(Some(frame))
    }

    fn seek(&mut self, index: u64) -> Result<(), SourceError> {
        let capture = &mut self.capture;
        apply_seek(&mut self.cursor, &self.info, index, || {
            capture
                .set(videoio::CAP_PROP_POS_FRAMES, index as f64)
                .map_err(|e| e.to_string())
        })
    }

    fn position(&self) -> u64 {
        self.cursor
    }
}

fn open_error(name: &str) -> impl Fn(opencv::Error) -> SourceError + '_ {
    move |e| SourceError::OpenFailed(format!("{name}: {e}"))
}
