//! 灰度图像变换

use image::{imageops, GrayImage, Luma};
use rand::Rng;
use rand_distr::StandardNormal;

/// 水平翻转（左右镜像）
pub fn flip_horizontal(image: &GrayImage) -> GrayImage {
    imageops::flip_horizontal(image)
}

/// 垂直翻转（上下镜像）
pub fn flip_vertical(image: &GrayImage) -> GrayImage {
    imageops::flip_vertical(image)
}

/// 绕图像中心逆时针旋转，输出尺寸不变
///
/// 最近邻采样，旋转后落在原图之外的像素填充为0。
pub fn rotate_about_center(image: &GrayImage, degrees: f64) -> GrayImage {
    let (width, height) = image.dimensions();
    let (sin, cos) = degrees.to_radians().sin_cos();
    let cx = width as f64 / 2.0;
    let cy = height as f64 / 2.0;

    GrayImage::from_fn(width, height, |x, y| {
        // 输出像素中心相对旋转中心的偏移，反向映射回源图
        let dx = x as f64 + 0.5 - cx;
        let dy = y as f64 + 0.5 - cy;
        let sx = (cx + dx * cos - dy * sin).floor();
        let sy = (cy + dx * sin + dy * cos).floor();

        if sx >= 0.0 && sy >= 0.0 && sx < width as f64 && sy < height as f64 {
            *image.get_pixel(sx as u32, sy as u32)
        } else {
            Luma([0])
        }
    })
}

/// 叠加高斯噪声：标准差为 255 * noise_level，截断到[0, 255]
pub fn add_gaussian_noise<R: Rng>(
    image: &GrayImage,
    noise_level: f64,
    rng: &mut R,
) -> GrayImage {
    let scale = 255.0 * noise_level;
    let mut noisy = image.clone();

    for pixel in noisy.pixels_mut() {
        let sample: f64 = rng.sample(StandardNormal);
        let value = pixel.0[0] as f64 + sample * scale;
        pixel.0[0] = value.clamp(0.0, 255.0) as u8;
    }

    noisy
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample() -> GrayImage {
        // 3x2:
        // 1 2 3
        // 4 5 6
        GrayImage::from_raw(3, 2, vec![1, 2, 3, 4, 5, 6]).unwrap()
    }

    #[test]
    fn test_flips() {
        let image = sample();

        assert_eq!(flip_horizontal(&image).into_raw(), vec![3, 2, 1, 6, 5, 4]);
        assert_eq!(flip_vertical(&image).into_raw(), vec![4, 5, 6, 1, 2, 3]);
    }

    #[test]
    fn test_rotate_zero_is_identity() {
        let image = sample();
        assert_eq!(rotate_about_center(&image, 0.0), image);
    }

    #[test]
    fn test_rotate_180_equals_double_flip() {
        let image = GrayImage::from_fn(4, 4, |x, y| Luma([(y * 4 + x) as u8]));

        let rotated = rotate_about_center(&image, 180.0);
        let flipped = flip_vertical(&flip_horizontal(&image));
        assert_eq!(rotated, flipped);
    }

    #[test]
    fn test_rotate_90_counter_clockwise() {
        // 2x2:
        // 1 2
        // 3 4
        let image = GrayImage::from_raw(2, 2, vec![1, 2, 3, 4]).unwrap();

        // 逆时针旋转90度:
        // 2 4
        // 1 3
        let rotated = rotate_about_center(&image, 90.0);
        assert_eq!(rotated.into_raw(), vec![2, 4, 1, 3]);
    }

    #[test]
    fn test_rotate_keeps_dimensions_and_fills_black() {
        let image = GrayImage::from_pixel(6, 4, Luma([200]));

        let rotated = rotate_about_center(&image, 45.0);
        assert_eq!(rotated.dimensions(), (6, 4));
        // 角落被旋转出原图范围
        assert_eq!(rotated.get_pixel(0, 0).0[0], 0);
        assert_eq!(rotated.get_pixel(3, 2).0[0], 200);
    }

    #[test]
    fn test_noise_zero_level_is_identity() {
        let image = sample();
        let mut rng = StdRng::seed_from_u64(7);

        assert_eq!(add_gaussian_noise(&image, 0.0, &mut rng), image);
    }

    #[test]
    fn test_noise_clips_and_is_seeded() {
        let image = GrayImage::from_fn(16, 16, |x, _| Luma([if x % 2 == 0 { 0 } else { 255 }]));

        let a = add_gaussian_noise(&image, 0.5, &mut StdRng::seed_from_u64(1));
        let b = add_gaussian_noise(&image, 0.5, &mut StdRng::seed_from_u64(1));

        assert_eq!(a, b);
        assert_eq!(a.dimensions(), image.dimensions());
        assert_ne!(a, image);
    }

    #[test]
    fn test_noise_standard_deviation() {
        let image = GrayImage::from_pixel(64, 64, Luma([128]));
        let noisy = add_gaussian_noise(&image, 0.1, &mut StdRng::seed_from_u64(3));

        let values: Vec<f64> = noisy.pixels().map(|p| p.0[0] as f64).collect();
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();

        // 标准差约为 255 * 0.1
        assert!((mean - 128.0).abs() < 3.0, "mean = {}", mean);
        assert!((22.0..29.0).contains(&std), "std = {}", std);
    }
}
