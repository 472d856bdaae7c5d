use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),
}

/// Every command the gimbal payload understands. Closed set; each variant has
/// exactly one payload in [`payload_for`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, IntoStaticStr, Display,
)]
#[strum(ascii_case_insensitive)]
pub enum CommandName {
    // ---- Gimbal movement ----
    #[strum(to_string = "left")]
    Left,
    #[strum(to_string = "right")]
    Right,
    #[strum(to_string = "up")]
    Up,
    #[strum(to_string = "down")]
    Down,
    #[strum(to_string = "stop")]
    Stop,
    #[strum(to_string = "recenter")]
    Recenter,
    #[strum(to_string = "angle90")]
    Angle90,
    #[strum(to_string = "follow_on")]
    FollowOn,
    #[strum(to_string = "follow_off")]
    FollowOff,
    #[strum(to_string = "motor_on")]
    MotorOn,
    #[strum(to_string = "motor_off")]
    MotorOff,

    // ---- Sensor & zoom ----
    #[strum(to_string = "zoom_in")]
    ZoomIn,
    #[strum(to_string = "zoom_out")]
    ZoomOut,
    #[strum(to_string = "stop_zoom")]
    StopZoom,
    #[strum(to_string = "zoom20x", serialize = "zoom_20x")]
    Zoom20x,
    #[strum(to_string = "picrec", serialize = "pic_rec")]
    PicRec,
    #[strum(to_string = "take_pic", serialize = "take_picture")]
    TakePicture,
    #[strum(to_string = "start_rec", serialize = "start_recording")]
    StartRecording,
    #[strum(to_string = "stop_rec", serialize = "stop_recording")]
    StopRecording,

    // ---- Digital zoom ----
    #[strum(to_string = "ir_dzoom_plus")]
    IrDigitalZoomPlus,
    #[strum(to_string = "ir_dzoom_minus")]
    IrDigitalZoomMinus,
    #[strum(to_string = "eo_dzoom_on")]
    EoDigitalZoomOn,
    #[strum(to_string = "eo_dzoom_off")]
    EoDigitalZoomOff,
}

impl CommandName {
    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// String lookup for the operator surface. Never falls back to a default payload.
pub fn lookup(name: &str) -> Result<CommandName, CommandError> {
    name.trim()
        .parse::<CommandName>()
        .map_err(|_| CommandError::UnknownCommand(name.trim().to_string()))
}

// 20-byte gimbal control frames: 55 AA DC 11 30 <14 bytes args> <xor>
const LEFT: [u8; 20] = [
    0x55, 0xAA, 0xDC, 0x11, 0x30, 0x01, 0xF8, 0x30, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0xE8,
];
const RIGHT: [u8; 20] = [
    0x55, 0xAA, 0xDC, 0x11, 0x30, 0x01, 0x07, 0xD0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0xF7,
];
const UP: [u8; 20] = [
    0x55, 0xAA, 0xDC, 0x11, 0x30, 0x01, 0x00, 0x00, 0x07, 0xD0, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0xF7,
];
const DOWN: [u8; 20] = [
    0x55, 0xAA, 0xDC, 0x11, 0x30, 0x01, 0x00, 0x00, 0xF8, 0x30, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0xE8,
];
const STOP: [u8; 20] = [
    0x55, 0xAA, 0xDC, 0x11, 0x30, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x20,
];
const ANGLE90: [u8; 20] = [
    0x55, 0xAA, 0xDC, 0x11, 0x30, 0x0B, 0x3F, 0xFC, 0x3F, 0xFC, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x2A,
];
const RECENTER: [u8; 20] = [
    0x55, 0xAA, 0xDC, 0x11, 0x30, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x25,
];
const FOLLOW_ON: [u8; 20] = [
    0x55, 0xAA, 0xDC, 0x11, 0x30, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x22,
];
const FOLLOW_OFF: [u8; 20] = [
    0x55, 0xAA, 0xDC, 0x11, 0x30, 0x0A, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x2B,
];
const MOTOR_ON: [u8; 20] = [
    0x55, 0xAA, 0xDC, 0x11, 0x30, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x20,
];
const MOTOR_OFF: [u8; 20] = [
    0x55, 0xAA, 0xDC, 0x11, 0x30, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x20,
];
const ZOOM_IN: [u8; 20] = [
    0x55, 0xAA, 0xDC, 0x11, 0x30, 0x0F, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02,
    0x78, 0x00, 0x00, 0x00, 0x54,
];
const ZOOM_OUT: [u8; 20] = [
    0x55, 0xAA, 0xDC, 0x11, 0x30, 0x0F, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02,
    0x38, 0x00, 0x00, 0x00, 0x14,
];
const STOP_ZOOM: [u8; 20] = [
    0x55, 0xAA, 0xDC, 0x11, 0x30, 0x0F, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x2E,
];
const PICREC: [u8; 20] = [
    0x55, 0xAA, 0xDC, 0x11, 0x30, 0x0F, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x06,
    0x10, 0x00, 0x00, 0x00, 0x38,
];
const TAKE_PIC: [u8; 20] = [
    0x55, 0xAA, 0xDC, 0x11, 0x30, 0x0F, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x04,
    0xD0, 0x00, 0x00, 0x00, 0xFA,
];
const START_REC: [u8; 20] = [
    0x55, 0xAA, 0xDC, 0x11, 0x30, 0x0F, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x05,
    0x10, 0x00, 0x00, 0x00, 0x3B,
];
const STOP_REC: [u8; 20] = [
    0x55, 0xAA, 0xDC, 0x11, 0x30, 0x0F, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x05,
    0x50, 0x00, 0x00, 0x00, 0x7B,
];
const IR_DZOOM_PLUS: [u8; 20] = [
    0x55, 0xAA, 0xDC, 0x11, 0x30, 0x0F, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x06,
    0xD0, 0x00, 0x00, 0x00, 0xF8,
];
const IR_DZOOM_MINUS: [u8; 20] = [
    0x55, 0xAA, 0xDC, 0x11, 0x30, 0x0F, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x07,
    0x10, 0x00, 0x00, 0x00, 0x39,
];

// 16-byte camera frames: 55 AA DC 0D 31 <10 bytes args> <xor>
const ZOOM_20X: [u8; 16] = [
    0x55, 0xAA, 0xDC, 0x0D, 0x31, 0x00, 0x00, 0x53, 0x00, 0xC8, 0x00, 0x00, 0x00, 0x00, 0x00,
    0xA7,
];
const EO_DZOOM_ON: [u8; 16] = [
    0x55, 0xAA, 0xDC, 0x0D, 0x31, 0x00, 0x00, 0x06, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x3A,
];
const EO_DZOOM_OFF: [u8; 16] = [
    0x55, 0xAA, 0xDC, 0x0D, 0x31, 0x00, 0x00, 0x07, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x3B,
];

/// Stored payload for a command, trailer byte included.
pub fn payload_for(name: CommandName) -> &'static [u8] {
    use CommandName::*;
    match name {
        Left => &LEFT,
        Right => &RIGHT,
        Up => &UP,
        Down => &DOWN,
        Stop => &STOP,
        Recenter => &RECENTER,
        Angle90 => &ANGLE90,
        FollowOn => &FOLLOW_ON,
        FollowOff => &FOLLOW_OFF,
        MotorOn => &MOTOR_ON,
        MotorOff => &MOTOR_OFF,
        ZoomIn => &ZOOM_IN,
        ZoomOut => &ZOOM_OUT,
        StopZoom => &STOP_ZOOM,
        Zoom20x => &ZOOM_20X,
        PicRec => &PICREC,
        TakePicture => &TAKE_PIC,
        StartRecording => &START_REC,
        StopRecording => &STOP_REC,
        IrDigitalZoomPlus => &IR_DZOOM_PLUS,
        IrDigitalZoomMinus => &IR_DZOOM_MINUS,
        EoDigitalZoomOn => &EO_DZOOM_ON,
        EoDigitalZoomOff => &EO_DZOOM_OFF,
    }
}
