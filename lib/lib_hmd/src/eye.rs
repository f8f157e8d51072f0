pub const EYE_COUNT: usize = 2;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Eye {
    Left = 0,
    Right = 1,
}

impl Eye {
    pub const BOTH: [Eye; EYE_COUNT] = [Eye::Left, Eye::Right];

    pub fn index(self) -> usize {
        self as usize
    }
}
