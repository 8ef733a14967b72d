//! Conversions between OpenCV matrices and `image` buffers

use crate::error::VisionError;
use image::{GrayImage, RgbImage};
use opencv::{
    core::{Mat, Scalar, CV_8UC1, CV_8UC3},
    prelude::*,
};

/// Copy an 8-bit BGR `Mat` into an RGB image
pub fn mat_to_rgb_image(mat: &Mat) -> Result<RgbImage, VisionError> {
    let (width, height) = (mat.cols(), mat.rows());
    if width <= 0 || height <= 0 {
        return Err(VisionError::Camera("Invalid image dimensions".to_string()));
    }
    if mat.typ() != CV_8UC3 {
        return Err(VisionError::Camera(format!(
            "Unsupported frame type {} (expected 8-bit BGR)",
            mat.typ()
        )));
    }

    let continuous;
    let mat = if mat.is_continuous() {
        mat
    } else {
        continuous = mat.try_clone()?;
        &continuous
    };

    let bgr = mat.data_bytes()?;
    let expected = width as usize * height as usize * 3;
    if bgr.len() < expected {
        return Err(VisionError::Camera(format!(
            "Frame buffer too small ({} < {})",
            bgr.len(),
            expected
        )));
    }

    let rgb: Vec<u8> = bgr[..expected]
        .chunks_exact(3)
        .flat_map(|px| [px[2], px[1], px[0]])
        .collect();

    RgbImage::from_raw(width as u32, height as u32, rgb)
        .ok_or_else(|| VisionError::Camera("Frame buffer size mismatch".to_string()))
}

/// Copy an RGB image into a new 8-bit BGR `Mat`
pub fn rgb_image_to_mat(image: &RgbImage) -> Result<Mat, VisionError> {
    let mut mat = Mat::new_rows_cols_with_default(
        image.height() as i32,
        image.width() as i32,
        CV_8UC3,
        Scalar::all(0.0),
    )?;

    let bytes = mat.data_bytes_mut()?;
    for (dst, src) in bytes.chunks_exact_mut(3).zip(image.pixels()) {
        dst[0] = src[2];
        dst[1] = src[1];
        dst[2] = src[0];
    }
    Ok(mat)
}

/// Copy a mask into a new single-channel `Mat`
pub fn gray_image_to_mat(image: &GrayImage) -> Result<Mat, VisionError> {
    let mut mat = Mat::new_rows_cols_with_default(
        image.height() as i32,
        image.width() as i32,
        CV_8UC1,
        Scalar::all(0.0),
    )?;
    mat.data_bytes_mut()?.copy_from_slice(image.as_raw());
    Ok(mat)
}
