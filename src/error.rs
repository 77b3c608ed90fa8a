use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    pub code: i32,
    pub message: String,
}

impl Error {
    pub fn new(code: i32, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
        }
    }
    /// 参数错误(1xxx), 在处理开始前检测
    pub fn is_configuration(&self) -> bool {
        (1000..2000).contains(&self.code)
    }
    /// 左右图尺寸不一致
    pub fn is_shape_mismatch(&self) -> bool {
        self.code == 2001
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)
    }
}

impl std::error::Error for Error {}

pub type Result<T, E = Error> = ::std::result::Result<T, E>;

pub static ERROR_1001: &str = "Image width or height can not be less than 1";
pub static ERROR_1002: &str = "Image disparity range can not be less than 1";
pub static ERROR_1003: &str = "Census window must contain between 1 and 64 neighbours";
pub static ERROR_1004: &str = "Region radius can not be negative";
pub static ERROR_1005: &str = "Minimum disparity can not be negative";
pub static ERROR_1006: &str = "Census cost metric requires a census transform";
pub static ERROR_1007: &str = "Right to left validation is not supported by the sparse matcher";
pub static ERROR_1008: &str = "Thresholds must be finite and not negative";
pub static ERROR_1009: &str = "Matching window is too large for the cost accumulator";

pub static ERROR_2001: &str = "Left and right images must have the same shape";
pub static ERROR_2002: &str = "Query point is outside of the image";
pub static ERROR_2003: &str = "Images must be set before querying a point";

pub static ERROR_3001: &str = "Failed to initialize the logger";
