/// Render command opcodes, in wire order.
///
/// Operands are listed as decoded; see [`CommandWriter`](super::CommandWriter)
/// for the encoding side.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(i32)]
pub enum RenderCmd {
    EndRender = 0,
    BeginCanvas = 1,             // canvas_id:Int32X, byte_size:Int32
    EndCanvas = 2,
    HeaderClearColor = 3,        // argb:Int32
    HeaderEnd = 4,
    LoadTexture = 5,             // id:Int32X, path:String
    PushObjectTransform = 6,     // m:Real32[16], replace:Logical
    PopObjectTransform = 7,      // count:Int32X
    PushViewTransform = 8,       // m:Real32[16], replace:Logical
    PopViewTransform = 9,        // count:Int32X
    PushProjectionTransform = 10, // m:Real32[16], replace:Logical
    PopProjectionTransform = 11, // count:Int32X
    DefineRenderMode = 12,       // id, shape:Int32X, src, dst:Byte, vs, fs:String
    UseRenderMode = 13,          // id:Int32X
    PushPositions = 14,          // count:Int32X, xyz:Real32[count*3]
    PushColors = 15,             // count:Int32X, argb:Int32[count]
    PushUvs = 16,                // count:Int32X, uv:Real32[count*2]
    UseTexture = 17,             // id:Int32X
    PushRotate = 18,             // stack, radians, axis:Real32[3], replace
    PushScale = 19,              // stack, s:Real32[3], replace
    PushTranslate = 20,          // stack, t:Real32[3], replace
    PushPerspective = 21,        // stack, fov_y, aspect, near, far, replace
    PushOrthographic = 22,       // stack, l, r, b, t, near, far, replace
    FillBox = 23,                // x, y, w, h:Real32, argb:Int32
    FillBoxMulticolor = 24,      // x, y, w, h, argb[4]
    FillTriangle = 25,           // x1..y3:Real32[6], argb
    FillTriangleMulticolor = 26, // x1..y3:Real32[6], argb[3]
    DrawLine = 27,               // x1, y1, x2, y2, argb
    DrawImage = 28,              // texture:Int32X, x, y, w, h, u1, v1, u2, v2, argb
}

impl RenderCmd {
    const ALL: [RenderCmd; 29] = [
        RenderCmd::EndRender,
        RenderCmd::BeginCanvas,
        RenderCmd::EndCanvas,
        RenderCmd::HeaderClearColor,
        RenderCmd::HeaderEnd,
        RenderCmd::LoadTexture,
        RenderCmd::PushObjectTransform,
        RenderCmd::PopObjectTransform,
        RenderCmd::PushViewTransform,
        RenderCmd::PopViewTransform,
        RenderCmd::PushProjectionTransform,
        RenderCmd::PopProjectionTransform,
        RenderCmd::DefineRenderMode,
        RenderCmd::UseRenderMode,
        RenderCmd::PushPositions,
        RenderCmd::PushColors,
        RenderCmd::PushUvs,
        RenderCmd::UseTexture,
        RenderCmd::PushRotate,
        RenderCmd::PushScale,
        RenderCmd::PushTranslate,
        RenderCmd::PushPerspective,
        RenderCmd::PushOrthographic,
        RenderCmd::FillBox,
        RenderCmd::FillBoxMulticolor,
        RenderCmd::FillTriangle,
        RenderCmd::FillTriangleMulticolor,
        RenderCmd::DrawLine,
        RenderCmd::DrawImage,
    ];

    #[inline]
    pub fn from_code(code: i32) -> Option<Self> {
        usize::try_from(code).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    #[inline]
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Transform stack selector used by the shorthand transform opcodes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum StackKind {
    Object,
    View,
    Projection,
}

impl StackKind {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(StackKind::Object),
            1 => Some(StackKind::View),
            2 => Some(StackKind::Projection),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            StackKind::Object => 0,
            StackKind::View => 1,
            StackKind::Projection => 2,
        }
    }
}
