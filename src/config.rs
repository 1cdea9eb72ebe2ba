//! Viewer configuration and per-frame draw toggles.

use crate::logging::LoggingConfig;
use crate::shading::ShaderVariant;

/// Which of the four streams are drawn each frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawConfig {
    pub draw_model: bool,
    pub draw_mesh: bool,
    pub draw_lines: bool,
    pub draw_points: bool,
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            draw_model: true,
            draw_mesh: false,
            draw_lines: false,
            draw_points: false,
        }
    }
}

impl DrawConfig {
    /// Everything on.
    pub fn all() -> Self {
        Self {
            draw_model: true,
            draw_mesh: true,
            draw_lines: true,
            draw_points: true,
        }
    }

    pub fn enabled(&self, variant: ShaderVariant) -> bool {
        match variant {
            ShaderVariant::Model => self.draw_model,
            ShaderVariant::Mesh => self.draw_mesh,
            ShaderVariant::Lines => self.draw_lines,
            ShaderVariant::Circles => self.draw_points,
        }
    }

    /// Flips the flag belonging to `variant` and returns its new value.
    pub fn toggle(&mut self, variant: ShaderVariant) -> bool {
        let flag = match variant {
            ShaderVariant::Model => &mut self.draw_model,
            ShaderVariant::Mesh => &mut self.draw_mesh,
            ShaderVariant::Lines => &mut self.draw_lines,
            ShaderVariant::Circles => &mut self.draw_points,
        };
        *flag = !*flag;
        *flag
    }

    /// Variants to draw, in draw order: faces first, markers last.
    pub fn variants(&self) -> impl Iterator<Item = ShaderVariant> + '_ {
        ShaderVariant::ALL
            .into_iter()
            .filter(|variant| self.enabled(*variant))
    }
}

/// Configuration for the viewer window and renderer.
#[derive(Clone, Debug)]
pub struct ViewerConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Clear color, straight RGBA.
    pub clear_color: [f64; 4],
    /// Base color of model faces, straight RGBA.
    pub model_color: [f32; 4],
    /// Half-diagonal of a point marker, as a fraction of the model's largest extent.
    pub marker_size: f32,
    pub draw: DrawConfig,
    pub logging: LoggingConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "Vista".to_string(),
            width: 800,
            height: 600,
            clear_color: [1.0, 1.0, 1.0, 1.0],
            model_color: [1.0, 0.0, 0.0, 1.0],
            marker_size: 0.03,
            draw: DrawConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ViewerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn clear_color(mut self, rgba: [f64; 4]) -> Self {
        self.clear_color = rgba;
        self
    }

    pub fn model_color(mut self, rgba: [f32; 4]) -> Self {
        self.model_color = rgba;
        self
    }

    pub fn marker_size(mut self, size: f32) -> Self {
        self.marker_size = size.max(0.0);
        self
    }

    pub fn draw(mut self, draw: DrawConfig) -> Self {
        self.draw = draw;
        self
    }

    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    /// The clear color as premultiplied `wgpu::Color`, matching the blend mode.
    pub fn clear_color_premultiplied(&self) -> wgpu::Color {
        let [r, g, b, a] = self.clear_color;
        wgpu::Color {
            r: r * a,
            g: g * a,
            b: b * a,
            a,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_draws_faces_only() {
        let config = DrawConfig::default();
        let variants: Vec<_> = config.variants().collect();
        assert_eq!(variants, vec![ShaderVariant::Model]);
    }

    #[test]
    fn toggle_flips_one_flag() {
        let mut config = DrawConfig::default();

        assert!(config.toggle(ShaderVariant::Circles));
        assert!(config.draw_points);
        assert!(!config.draw_mesh);

        assert!(!config.toggle(ShaderVariant::Model));
        let variants: Vec<_> = config.variants().collect();
        assert_eq!(variants, vec![ShaderVariant::Circles]);
    }

    #[test]
    fn all_draws_in_fixed_order() {
        let variants: Vec<_> = DrawConfig::all().variants().collect();
        assert_eq!(variants, ShaderVariant::ALL.to_vec());
    }

    #[test]
    fn builder_sets_fields() {
        let config = ViewerConfig::new()
            .title("Part")
            .size(1280, 720)
            .marker_size(-1.0)
            .clear_color([0.5, 0.5, 0.5, 0.5]);

        assert_eq!(config.title, "Part");
        assert_eq!((config.width, config.height), (1280, 720));
        assert_eq!(config.marker_size, 0.0);

        let clear = config.clear_color_premultiplied();
        assert_eq!((clear.r, clear.a), (0.25, 0.5));
    }
}
