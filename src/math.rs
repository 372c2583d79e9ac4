//! Simple math utilities.

/// Simple two-dimensional vector of any numerical type.
/// Supports only few mathematical operations
/// as this is used mainly as data struct.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Vec2<T> (pub T, pub T);

impl<T> Vec2<T> {

    /// Seeing this vector as a dimension or size (width and height),
    /// this returns the area that this dimensions contains (`width * height`).
    pub fn area(self) -> T where T: std::ops::Mul<T, Output = T> {
        self.0 * self.1
    }

    /// The first component of this 2D vector.
    pub fn width(self) -> T { self.0 }

    /// The second component of this 2D vector.
    pub fn height(self) -> T { self.1 }

    /// The first component of this 2D vector.
    pub fn x(self) -> T { self.0 }

    /// The second component of this 2D vector.
    pub fn y(self) -> T { self.1 }
}


impl<T: std::ops::Add<T>> std::ops::Add<Vec2<T>> for Vec2<T> {
    type Output = Vec2<T::Output>;
    fn add(self, other: Vec2<T>) -> Self::Output {
        Vec2(self.0 + other.0, self.1 + other.1)
    }
}

impl<T: std::ops::Sub<T>> std::ops::Sub<Vec2<T>> for Vec2<T> {
    type Output = Vec2<T::Output>;
    fn sub(self, other: Vec2<T>) -> Self::Output {
        Vec2(self.0 - other.0, self.1 - other.1)
    }
}

impl<T> From<(T, T)> for Vec2<T> {
    fn from((x, y): (T, T)) -> Self { Vec2(x, y) }
}


/// A rectangle of pixels inside the logical screen,
/// as declared by an image descriptor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {

    /// The top left corner of the rectangle.
    pub position: Vec2<usize>,

    /// The number of pixels in the rectangle.
    pub size: Vec2<usize>,
}

impl Rect {

    /// Create a rectangle from its top left corner and its size.
    pub fn new(position: impl Into<Vec2<usize>>, size: impl Into<Vec2<usize>>) -> Self {
        Rect { position: position.into(), size: size.into() }
    }

    /// A rectangle at the origin.
    pub fn from_size(size: impl Into<Vec2<usize>>) -> Self {
        Self::new(Vec2(0, 0), size)
    }

    /// The exclusive bottom right corner of the rectangle.
    pub fn end(self) -> Vec2<usize> {
        self.position + self.size
    }

    /// Returns the part of this rectangle that lies inside a canvas of the specified size.
    pub fn clip_to(self, canvas: Vec2<usize>) -> Self {
        let start = Vec2(self.position.0.min(canvas.0), self.position.1.min(canvas.1));
        let end = Vec2(self.end().0.min(canvas.0), self.end().1.min(canvas.1));
        Rect { position: start, size: end - start }
    }

    /// Whether the pixel lies inside this rectangle.
    pub fn contains(self, pixel: Vec2<usize>) -> bool {
        pixel.0 >= self.position.0 && pixel.1 >= self.position.1
            && pixel.0 < self.end().0 && pixel.1 < self.end().1
    }
}


/// Computes `ceil(log(x)/log(2))`. Returns 0 where argument is 0.
pub(crate) fn ceil_log_2(mut number: u32) -> u32 {
    let mut log = 0;
    let mut round_up = 0;

    while number > 1 {
        if number & 1 != 0 {
            round_up = 1;
        }

        log +=  1;
        number >>= 1;
    }

    log + round_up
}


/// The source row order of an interlaced image:
/// every 8th row starting at 0, every 8th row starting at 4,
/// every 4th row starting at 2, and finally every 2nd row starting at 1.
/// Yields the destination line of each encoded row in turn.
#[derive(Debug, Clone)]
pub struct InterlacedLines {
    height: usize,
    pass: usize,
    line: usize,
}

/// Start line and line increment of the four interlace passes.
const INTERLACE_PASSES: [(usize, usize); 4] = [ (0, 8), (4, 8), (2, 4), (1, 2) ];

impl InterlacedLines {

    /// Iterate the destination lines of an interlaced image with the specified height.
    pub fn new(height: usize) -> Self {
        InterlacedLines { height, pass: 0, line: 0 }
    }
}

impl Iterator for InterlacedLines {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.pass < INTERLACE_PASSES.len() {
            let (start, step) = INTERLACE_PASSES[self.pass];
            let line = start + self.line * step;

            if line < self.height {
                self.line += 1;
                return Some(line);
            }

            self.pass += 1;
            self.line = 0;
        }

        None
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn log2(){
        assert_eq!(ceil_log_2(0), 0);
        assert_eq!(ceil_log_2(1), 0);
        assert_eq!(ceil_log_2(2), 1);
        assert_eq!(ceil_log_2(3), 2);
        assert_eq!(ceil_log_2(256), 8);
        assert_eq!(ceil_log_2(257), 9);
    }

    #[test]
    fn interlace_order(){
        let lines: Vec<usize> = InterlacedLines::new(8).collect();
        assert_eq!(lines, vec![ 0, 4, 2, 6, 1, 3, 5, 7 ]);

        let lines: Vec<usize> = InterlacedLines::new(10).collect();
        assert_eq!(lines, vec![ 0, 8, 4, 2, 6, 1, 3, 5, 7, 9 ]);

        let lines: Vec<usize> = InterlacedLines::new(3).collect();
        assert_eq!(lines, vec![ 0, 2, 1 ]);

        assert_eq!(InterlacedLines::new(0).count(), 0);
        assert_eq!(InterlacedLines::new(1).collect::<Vec<_>>(), vec![ 0 ]);
    }

    #[test]
    fn interlace_is_permutation(){
        for height in 0 .. 64 {
            let mut lines: Vec<usize> = InterlacedLines::new(height).collect();
            lines.sort_unstable();
            assert_eq!(lines, (0 .. height).collect::<Vec<_>>(), "height {}", height);
        }
    }

    #[test]
    fn clip(){
        let rect = Rect::new((3, 4), (10, 10));
        assert_eq!(rect.clip_to(Vec2(8, 20)), Rect::new((3, 4), (5, 10)));
        assert_eq!(Rect::new((30, 4), (10, 10)).clip_to(Vec2(8, 8)).size, Vec2(0, 4));
        assert!(rect.contains(Vec2(3, 4)));
        assert!(!rect.contains(Vec2(13, 4)));
    }
}
