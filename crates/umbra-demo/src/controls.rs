use umbra_engine::coords::Vec2;
use umbra_engine::scene::ConeInput;
use winit::keyboard::KeyCode;

/// Map units per second while a movement key is held.
const MOVE_SPEED: f32 = 320.0;
/// Degrees per second while a rotate or cone key is held.
const TURN_SPEED: f32 = 120.0;
const MIN_CONE_DEG: f32 = 5.0;

/// One-shot requests the app acts on immediately.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
    ToggleAmbient,
    ToggleOutline,
    Quit,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Held {
    Up,
    Down,
    Left,
    Right,
    RotateCcw,
    RotateCw,
    Narrow,
    Widen,
}

impl Held {
    const COUNT: usize = 8;

    fn from_key(code: KeyCode) -> Option<Self> {
        Some(match code {
            KeyCode::ArrowUp | KeyCode::KeyW => Held::Up,
            KeyCode::ArrowDown | KeyCode::KeyS => Held::Down,
            KeyCode::ArrowLeft | KeyCode::KeyA => Held::Left,
            KeyCode::ArrowRight | KeyCode::KeyD => Held::Right,
            KeyCode::KeyQ => Held::RotateCcw,
            KeyCode::KeyE => Held::RotateCw,
            KeyCode::KeyZ => Held::Narrow,
            KeyCode::KeyX => Held::Widen,
            _ => return None,
        })
    }
}

/// Keyboard state for the controllable light.
///
/// Offsets are relative to the map center and stay inside the map.
#[derive(Debug, Clone)]
pub struct Controls {
    held: [bool; Held::COUNT],
    half_extent: Vec2,

    pub horizontal: f32,
    pub vertical: f32,
    pub angle_deg: f32,
    pub rotation_deg: f32,
    pub enabled: bool,
}

impl Controls {
    pub fn new(extent: Vec2) -> Self {
        Self {
            held: [false; Held::COUNT],
            half_extent: extent * 0.5,
            horizontal: 0.0,
            vertical: 0.0,
            angle_deg: 360.0,
            rotation_deg: 0.0,
            enabled: true,
        }
    }

    /// Records a key transition. Returns a command for one-shot keys on press.
    pub fn on_key(&mut self, code: KeyCode, pressed: bool) -> Option<Command> {
        if let Some(held) = Held::from_key(code) {
            self.held[held as usize] = pressed;
            return None;
        }
        if !pressed {
            return None;
        }

        match code {
            KeyCode::Space => {
                self.enabled = !self.enabled;
                None
            }
            KeyCode::KeyL => Some(Command::ToggleAmbient),
            KeyCode::KeyO => Some(Command::ToggleOutline),
            KeyCode::Escape => Some(Command::Quit),
            _ => None,
        }
    }

    /// Integrates held keys over `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        let axis = |neg: Held, pos: Held| {
            (self.held[pos as usize] as i32 - self.held[neg as usize] as i32) as f32
        };

        let dx = axis(Held::Left, Held::Right);
        let dy = axis(Held::Up, Held::Down);
        let turn = axis(Held::RotateCcw, Held::RotateCw);
        let widen = axis(Held::Narrow, Held::Widen);

        self.horizontal = (self.horizontal + dx * MOVE_SPEED * dt)
            .clamp(-self.half_extent.x, self.half_extent.x);
        self.vertical = (self.vertical + dy * MOVE_SPEED * dt)
            .clamp(-self.half_extent.y, self.half_extent.y);

        self.rotation_deg = (self.rotation_deg + turn * TURN_SPEED * dt).rem_euclid(360.0);
        self.angle_deg = (self.angle_deg + widen * TURN_SPEED * dt).clamp(MIN_CONE_DEG, 360.0);
    }

    pub fn cone(&self) -> ConeInput {
        ConeInput {
            angle_deg: self.angle_deg,
            rotation_deg: self.rotation_deg,
            toggle_axis: if self.enabled { 1.0 } else { 0.0 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controls() -> Controls {
        Controls::new(Vec2::new(200.0, 100.0))
    }

    // ── movement ──────────────────────────────────────────────────────────

    #[test]
    fn held_key_moves_until_released() {
        let mut c = controls();
        c.on_key(KeyCode::ArrowRight, true);
        c.step(0.1);
        assert!((c.horizontal - 32.0).abs() < 1e-4);

        c.on_key(KeyCode::ArrowRight, false);
        c.step(0.1);
        assert!((c.horizontal - 32.0).abs() < 1e-4);
        assert_eq!(c.vertical, 0.0);
    }

    #[test]
    fn opposite_keys_cancel() {
        let mut c = controls();
        c.on_key(KeyCode::KeyW, true);
        c.on_key(KeyCode::KeyS, true);
        c.step(1.0);
        assert_eq!(c.vertical, 0.0);
    }

    #[test]
    fn offset_stays_inside_the_map() {
        let mut c = controls();
        c.on_key(KeyCode::ArrowUp, true);
        c.on_key(KeyCode::ArrowLeft, true);
        c.step(10.0);
        assert_eq!(c.horizontal, -100.0);
        assert_eq!(c.vertical, -50.0);
    }

    // ── cone ──────────────────────────────────────────────────────────────

    #[test]
    fn rotation_wraps() {
        let mut c = controls();
        c.on_key(KeyCode::KeyQ, true);
        c.step(0.5);
        assert!((c.rotation_deg - 300.0).abs() < 1e-3);
    }

    #[test]
    fn cone_angle_is_bounded() {
        let mut c = controls();
        c.on_key(KeyCode::KeyX, true);
        c.step(1.0);
        assert_eq!(c.angle_deg, 360.0);

        c.on_key(KeyCode::KeyX, false);
        c.on_key(KeyCode::KeyZ, true);
        c.step(100.0);
        assert_eq!(c.angle_deg, MIN_CONE_DEG);
    }

    // ── one-shot keys ─────────────────────────────────────────────────────

    #[test]
    fn space_flips_the_toggle_axis() {
        let mut c = controls();
        assert_eq!(c.cone().toggle_axis, 1.0);
        assert_eq!(c.on_key(KeyCode::Space, true), None);
        assert_eq!(c.cone().toggle_axis, 0.0);
        c.on_key(KeyCode::Space, false);
        assert_eq!(c.cone().toggle_axis, 0.0);
    }

    #[test]
    fn commands_fire_on_press_only() {
        let mut c = controls();
        assert_eq!(c.on_key(KeyCode::KeyL, true), Some(Command::ToggleAmbient));
        assert_eq!(c.on_key(KeyCode::KeyL, false), None);
        assert_eq!(c.on_key(KeyCode::KeyO, true), Some(Command::ToggleOutline));
        assert_eq!(c.on_key(KeyCode::Escape, true), Some(Command::Quit));
        assert_eq!(c.on_key(KeyCode::KeyP, true), None);
    }
}
