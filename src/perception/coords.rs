use image::RgbImage;

/// External on-screen text reader (OCR). Parsing failures yield `None`;
/// the core keeps its last-known position.
pub trait TextReader: Send {
    fn read_coordinates(&mut self, frame: &RgbImage) -> Option<(i32, i32, i32)>;
}

/// Placeholder reader: never sees coordinates.
pub struct NullTextReader;

impl TextReader for NullTextReader {
    fn read_coordinates(&mut self, _frame: &RgbImage) -> Option<(i32, i32, i32)> {
        None
    }
}

/// Pull the first three signed integers out of raw OCR text, e.g.
/// "Position: 1485, 71, 3". OCR output is noisy; anything that does not
/// contain three numbers is a parse failure.
pub fn parse_coordinates(text: &str) -> Option<(i32, i32, i32)> {
    let mut numbers = Vec::with_capacity(3);
    let mut current = String::new();

    for c in text.chars() {
        if c.is_ascii_digit() || (c == '-' && current.is_empty()) {
            current.push(c);
        } else if !current.is_empty() {
            if let Ok(n) = current.parse::<i32>() {
                numbers.push(n);
                if numbers.len() == 3 {
                    break;
                }
            }
            current.clear();
        }
    }
    if numbers.len() < 3 {
        if let Ok(n) = current.parse::<i32>() {
            numbers.push(n);
        }
    }

    if numbers.len() >= 3 {
        Some((numbers[0], numbers[1], numbers[2]))
    } else {
        None
    }
}
