use std::sync::{Mutex, PoisonError};

use glam::{Mat4, Vec3};
use plasma_engine::bus::RuntimeLink;
use plasma_engine::input::names;
use plasma_engine::render::{BlendFactor, CommandWriter, ModeDef, Shape, StackKind};
use plasma_wire::Message;

const DEMO_TEXTURE: i32 = 1;
const GLOW_MODE: i32 = 1;

const BACKDROP_TOP: u32 = 0xFF20_2840;
const BACKDROP_BOTTOM: u32 = 0xFF0C_0C14;
const GRID: u32 = 0x30FF_FFFF;
const GRID_STEP: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextureState {
    Absent,
    Requested,
    Ready { width: u32, height: u32 },
    Failed,
}

struct DemoState {
    frame: u64,
    pointer: Option<(f32, f32)>,
    pressed: bool,
    texture_path: Option<String>,
    texture: TextureState,
}

/// A built-in runtime written against the message protocol.
///
/// Answers `Display.render` with an animated scene, follows the pointer,
/// and shows an optional image once `Texture.on_load` confirms it.
pub struct DemoRuntime {
    state: Mutex<DemoState>,
}

impl DemoRuntime {
    pub fn new(texture_path: Option<String>) -> Self {
        Self {
            state: Mutex::new(DemoState {
                frame: 0,
                pointer: None,
                pressed: false,
                texture_path,
                texture: TextureState::Absent,
            }),
        }
    }

    /// Handles one inbound message; returns the same-call reply, if any.
    pub fn handle(&self, mut m: Message) -> Option<Message> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let ty = m.type_name().to_owned();
        match ty.as_str() {
            names::RENDER => {
                let _display_id = m.read_int32x();
                let width = m.read_int32x() as f32;
                let height = m.read_int32x() as f32;
                let reply = render(&mut state, m.id(), width, height);
                state.frame += 1;
                return Some(reply);
            }

            names::POINTER => {
                let _display_id = m.read_int32x();
                let kind = m.read_int32x();
                let (x, y) = (m.read_int32x() as f32, m.read_int32x() as f32);
                let index = m.read_int32x();
                state.pointer = Some((x, y));
                if index == 0 {
                    match kind {
                        1 => state.pressed = true,
                        2 => state.pressed = false,
                        _ => {}
                    }
                }
            }

            names::KEY => {
                let _display_id = m.read_int32x();
                let is_press = m.read_logical();
                let keycode = m.read_int32x();
                log::debug!("demo: key {keycode} {}", if is_press { "down" } else { "up" });
            }

            names::TEXT => {
                let _display_id = m.read_int32x();
                let _unicode = m.read_int32x();
                log::debug!("demo: text {:?}", m.read_string());
            }

            names::FOCUS_GAINED => log::info!("demo: display focused"),

            "Texture.on_load" => {
                let id = m.read_int32x();
                let success = m.read_logical();
                if id == DEMO_TEXTURE {
                    state.texture = if success {
                        let width = m.read_int32x() as u32;
                        let height = m.read_int32x() as u32;
                        log::info!("demo: texture ready ({width}x{height})");
                        TextureState::Ready { width, height }
                    } else {
                        log::warn!("demo: texture failed to load");
                        TextureState::Failed
                    };
                }
            }

            other => log::trace!("demo: ignoring {other:?}"),
        }
        None
    }
}

impl RuntimeLink for DemoRuntime {
    fn send_message(&self, bytes: &[u8]) -> Option<Vec<u8>> {
        self.handle(Message::parse(bytes.to_vec())).map(Message::into_bytes)
    }
}

fn render(state: &mut DemoState, request_id: i32, width: f32, height: f32) -> Message {
    let mut w = CommandWriter::new(Message::reply_to(request_id, false));

    if state.texture == TextureState::Absent {
        if let Some(path) = &state.texture_path {
            w.load_texture(DEMO_TEXTURE, path);
            state.texture = TextureState::Requested;
        }
    }

    let angle = state.frame as f32 * 0.02;
    let (cx, cy) = (width * 0.5, height * 0.5);

    w.canvas(0, Some(BACKDROP_BOTTOM), |c| {
        c.orthographic(StackKind::Projection, [0.0, width, height, 0.0, -1.0, 1.0], true);

        c.fill_box_multicolor(
            0.0,
            0.0,
            width,
            height,
            [BACKDROP_TOP, BACKDROP_TOP, BACKDROP_BOTTOM, BACKDROP_BOTTOM],
        );
        for x in (0..width as usize).step_by(GRID_STEP) {
            c.draw_line(x as f32, 0.0, x as f32, height, GRID);
        }
        for y in (0..height as usize).step_by(GRID_STEP) {
            c.draw_line(0.0, y as f32, width, y as f32, GRID);
        }

        // Additive halo behind the spinner.
        c.define_render_mode(
            GLOW_MODE,
            &ModeDef::new(Shape::Triangles, "vs_color", "fs_color")
                .with_blend(BlendFactor::SrcAlpha, BlendFactor::One),
        );
        c.use_render_mode(GLOW_MODE);
        let r = 140.0 + 10.0 * (angle * 3.0).sin();
        let (l, t, rt, b) = (cx - r, cy - r, cx + r, cy + r);
        c.push_positions(&[
            [l, t, 0.0],
            [rt, t, 0.0],
            [rt, b, 0.0],
            [l, t, 0.0],
            [rt, b, 0.0],
            [l, b, 0.0],
        ]);
        c.push_colors(&[0x00_3060FF, 0x00_3060FF, 0x60_3060FF, 0x00_3060FF, 0x60_3060FF, 0x60_3060FF]);

        c.push_transform(StackKind::Object, Mat4::from_translation(Vec3::new(cx, cy, 0.0)), false);
        c.rotate(StackKind::Object, angle, Vec3::Z, false);
        c.fill_triangle_multicolor(
            [0.0, -90.0, 78.0, 45.0, -78.0, 45.0],
            [0xFFFF_5050, 0xFF50_FF50, 0xFF50_50FF],
        );
        c.pop_transform(StackKind::Object, 2);

        if let TextureState::Ready { width: tw, height: th } = state.texture {
            let scale = (192.0 / tw.max(th) as f32).min(1.0);
            c.draw_image(
                DEMO_TEXTURE,
                [16.0, 16.0, tw as f32 * scale, th as f32 * scale],
                [0.0, 0.0, 1.0, 1.0],
                0xFFFF_FFFF,
            );
        }

        if let Some((px, py)) = state.pointer {
            let color = if state.pressed { 0xFFFF_D040 } else { 0xFFFF_FFFF };
            c.fill_box(px - 4.0, py - 4.0, 8.0, 8.0, color);
        }
    });

    w.finish()
}
