//! Assembly of multi-part ("multiple") sprites.
//!
//! Each part is decoded on its own under `"<entry key> <part>"`. One
//! dimension of every part is fixed by the request and the other is inferred
//! from the decoded pixel count:
//!
//! | direction    | parts                                         | fixed  |
//! |--------------|-----------------------------------------------|--------|
//! | `vertical`   | `top`, `middle`, `bottom`                     | width  |
//! | `horizontal` | `left`, `middle`, `right`                     | height |
//! | `corners`    | `top_left`, `top_right`, `bottom_left`, `bottom_right` | height |
//!
//! Nothing is drawn here; the render layer lays the parts out using the
//! thickness table and the stretch flag.

use std::collections::BTreeMap;

use log::debug;

use crate::decode::{Decoder, Dimensions, Substitution};
use crate::error::{CodecError, Result};
use crate::models::{CompositeSprite, DecodeRequest, Direction, Flip};

/// Name of the part that stretches.
pub const MIDDLE: &str = "middle";

/// Role a part takes once the whole composite is mirrored.
pub fn mirrored_role(part: &str, flip: Flip) -> &str {
    let part = if flip.mirrors_horizontally() {
        match part {
            "left" => "right",
            "right" => "left",
            "top_left" => "top_right",
            "top_right" => "top_left",
            "bottom_left" => "bottom_right",
            "bottom_right" => "bottom_left",
            other => other,
        }
    } else {
        part
    };
    if flip.mirrors_vertically() {
        match part {
            "top" => "bottom",
            "bottom" => "top",
            "top_left" => "bottom_left",
            "bottom_left" => "top_left",
            "top_right" => "bottom_right",
            "bottom_right" => "top_right",
            other => other,
        }
    } else {
        part
    }
}

/// Decode every part of a composite entry.
pub fn assemble(
    decoder: &mut Decoder,
    entry_key: &str,
    direction: Direction,
    parts: &BTreeMap<String, String>,
    request: &DecodeRequest,
    substitution: &Substitution,
) -> Result<CompositeSprite> {
    let scale = decoder.scale() as u32;
    let mut images = BTreeMap::new();
    let mut thickness = BTreeMap::new();

    for (name, source) in parts {
        if !direction.parts().contains(&name.as_str()) {
            return Err(CodecError::UnknownPart {
                part: name.clone(),
                direction: direction.to_string(),
            });
        }

        let key = format!("{} {}", entry_key, name);
        let pixels = decoder.decode_pixels(source, substitution)?;
        let count = decoder.source_pixel_count(&pixels);
        let (width, height) = infer_dimensions(direction, request, count, &key)?;
        let image = decoder.fit(pixels, &key, Dimensions { width, height, flip: request.flip })?;

        let role = mirrored_role(name, request.flip).to_string();
        if role != MIDDLE {
            let size = match direction {
                Direction::Vertical => height,
                Direction::Horizontal | Direction::Corners => width,
            };
            thickness.insert(role.clone(), size * scale);
        }
        images.insert(role, image);
    }

    let stretch_middle = request.stretch && images.contains_key(MIDDLE);
    debug!("assembled {} composite '{}' from {} parts", direction, entry_key, images.len());
    Ok(CompositeSprite { direction, parts: images, thickness, stretch_middle })
}

fn infer_dimensions(
    direction: Direction,
    request: &DecodeRequest,
    count: usize,
    key: &str,
) -> Result<(u32, u32)> {
    let fixed = match direction {
        Direction::Vertical => request.width,
        Direction::Horizontal | Direction::Corners => request.height,
    } as usize;
    if fixed == 0 || count % fixed != 0 {
        let axis = if direction == Direction::Vertical { "width" } else { "height" };
        return Err(CodecError::DimensionMismatch {
            key: key.to_string(),
            expected: format!("a multiple of {} {}", axis, fixed),
            actual: count,
        });
    }
    let other = (count / fixed) as u32;
    Ok(match direction {
        Direction::Vertical => (fixed as u32, other),
        Direction::Horizontal | Direction::Corners => (other, fixed as u32),
    })
}
