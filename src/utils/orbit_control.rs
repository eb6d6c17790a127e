use std::f32::consts::PI;

use glam::{Vec2, Vec3};
use winit::event::MouseButton;

use crate::app::input::Input;
use crate::config::ControlsConfig;
use crate::scene::transform::Transform;

const POLE_EPS: f32 = 0.0001;

/// Orbit camera controller.
///
/// Left drag rotates around `center`, right drag pans, the wheel zooms.
/// With damping on, rotation keeps easing out after the drag stops.
pub struct OrbitControls {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub damping_factor: f32,
    pub enable_damping: bool,
    pub min_distance: f32,
    pub max_distance: f32,

    pub center: Vec3,
    pub radius: f32,
    /// Azimuth around +Y, radians
    pub theta: f32,
    /// Polar angle from +Y, radians
    pub phi: f32,

    rotate_delta: Vec2,
}

impl OrbitControls {
    #[must_use]
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            rotate_speed: 1.0,
            zoom_speed: 0.05,
            pan_speed: 1.0,
            damping_factor: 0.05,
            enable_damping: true,
            min_distance: 0.1,
            max_distance: 1000.0,

            center,
            radius,
            theta: 0.0,
            phi: PI / 2.0,

            rotate_delta: Vec2::ZERO,
        }
    }

    /// Controller that starts exactly at `position`, looking at `center`.
    #[must_use]
    pub fn looking_at(position: Vec3, center: Vec3) -> Self {
        let offset = position - center;
        let radius = offset.length().max(POLE_EPS);
        let mut controls = Self::new(center, radius);
        controls.theta = offset.x.atan2(offset.z);
        controls.phi = (offset.y / radius).clamp(-1.0, 1.0).acos();
        controls
    }

    /// Applies speeds and damping from the viewer config.
    #[must_use]
    pub fn with_config(mut self, config: &ControlsConfig) -> Self {
        self.enable_damping = config.enable_damping;
        self.damping_factor = config.damping_factor.clamp(0.0, 1.0);
        self.rotate_speed = config.rotate_speed;
        self.zoom_speed *= config.zoom_speed;
        self.pan_speed = config.pan_speed;
        self
    }

    /// Pending rotation that damping has not applied yet.
    #[must_use]
    pub fn pending_rotation(&self) -> Vec2 {
        self.rotate_delta
    }

    /// Camera position for the current orbit state.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.center + self.offset_direction() * self.radius
    }

    fn offset_direction(&self) -> Vec3 {
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_theta, cos_theta) = self.theta.sin_cos();
        Vec3::new(sin_phi * sin_theta, cos_phi, sin_phi * cos_theta)
    }

    /// Consumes this frame's input and moves `transform` onto the orbit.
    pub fn update(&mut self, transform: &mut Transform, input: &Input, fov_degrees: f32, dt: f32) {
        let screen_height = input.screen_size.y.max(1.0);

        if input.is_button_pressed(MouseButton::Left) {
            let rotate_per_pixel = 2.0 * PI / screen_height;
            self.rotate_delta -= input.cursor_delta * rotate_per_pixel * self.rotate_speed;
        }

        if self.enable_damping {
            // Frame-rate independent: the fraction retained after one 60 Hz frame is (1 - damping)
            let retention = (1.0 - self.damping_factor).powf(dt * 60.0);
            let applied = self.rotate_delta * (1.0 - retention);

            self.theta += applied.x;
            self.phi += applied.y;
            self.rotate_delta *= retention;
        } else {
            self.theta += self.rotate_delta.x;
            self.phi += self.rotate_delta.y;
            self.rotate_delta = Vec2::ZERO;
        }

        self.phi = self.phi.clamp(POLE_EPS, PI - POLE_EPS);

        if input.scroll_delta.y != 0.0 {
            let scale = (1.0 - self.zoom_speed).powf(input.scroll_delta.y.abs());
            if input.scroll_delta.y > 0.0 {
                self.radius *= scale;
            } else {
                self.radius /= scale;
            }
            self.radius = self.radius.clamp(self.min_distance, self.max_distance);
        }

        if input.is_button_pressed(MouseButton::Right) {
            let half_fov = fov_degrees.to_radians() / 2.0;
            let world_height = 2.0 * self.radius * half_fov.tan();
            let pixels_to_world = world_height / screen_height;

            let forward = -self.offset_direction();
            let right = forward.cross(Vec3::Y).normalize_or(Vec3::X);
            let up = right.cross(forward).normalize_or(Vec3::Y);

            self.center += (right * -input.cursor_delta.x + up * input.cursor_delta.y) * pixels_to_world * self.pan_speed;
        }

        transform.position = self.position();
        transform.look_at(self.center, Vec3::Y);
    }
}
