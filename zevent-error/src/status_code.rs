use std::fmt;

use num_enum::TryFromPrimitive;
#[cfg(feature = "strum")]
use strum_macros::{AsRefStr, EnumIter};

/// Коды статуса для категоризации ошибок реестра событий.
///
/// # Диапазоны:
/// - 3xxx: Доставка (dispatch) и promise-мост
/// - 4xxx: Конфигурация и окружение
/// - 6xxx: IO
///
/// `num_enum::TryFromPrimitive` даёт `TryFrom<u32>`; при включённом
/// feature `strum` доступны `AsRefStr`/`EnumIter`.
#[cfg_attr(feature = "strum", derive(AsRefStr, EnumIter))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u32)]
#[non_exhaustive]
pub enum StatusCode {
    // === 3xxx: Доставка ===
    HandlerPanicked = 3000,
    Abandoned = 3001,

    // === 4xxx: Конфигурация ===
    InvalidConfig = 4000,
    ConfigLoad = 4001,
    LoggingInit = 4002,

    // === 6xxx: IO ===
    Io = 6000,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl StatusCode {
    /// Числовое представление кода статуса.
    pub const fn code(self) -> u32 {
        self as u32
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для StatusCode
////////////////////////////////////////////////////////////////////////////////

impl From<StatusCode> for u32 {
    fn from(c: StatusCode) -> Self {
        c.code()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        #[cfg(feature = "strum")]
        {
            write!(f, "{} ({})", self.as_ref(), self.code())
        }
        #[cfg(not(feature = "strum"))]
        {
            write!(f, "{:?} ({})", self, self.code())
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
