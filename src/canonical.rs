// Symmetry reduction for transposition keys
//
// A position and the player who just moved are mapped onto the smallest of
// their 16 images under rotation, vertical flip and colour inversion. The
// player sign flips together with the colours.

use crate::types::{Board, Player, BOARD_SIZE};

/// Number of images generated per position
pub const SYMMETRY_COUNT: usize = 16;

/// Symmetry-invariant representative of a (board, player) pair
///
/// Ordered by the board bytes first; the player sign only separates images whose
/// bytes coincide, which keeps the choice independent of the starting orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalKey {
    pub cells: [u8; BOARD_SIZE * BOARD_SIZE],
    pub player: i8,
}

impl CanonicalKey {
    fn of(board: &Board, player: Player) -> Self {
        CanonicalKey {
            cells: board.to_bytes(),
            player: player.sign(),
        }
    }
}

/// All images of `board` under the 4 rotations x vertical flip x colour inversion
///
/// For each rotation the order is: plain, flipped, inverted, flipped and inverted.
pub fn symmetric_images(board: &Board, player: Player) -> [(Board, Player); SYMMETRY_COUNT] {
    let mut images = [(*board, player); SYMMETRY_COUNT];
    let mut current = *board;

    for rotation in 0..4 {
        let inverted = current.inverted();
        let base = rotation * 4;
        images[base] = (current, player);
        images[base + 1] = (current.flipped(), player);
        images[base + 2] = (inverted, player.opponent());
        images[base + 3] = (inverted.flipped(), player.opponent());
        current = current.rotated();
    }

    images
}

/// Canonical transposition key of `board` as reached by `player`'s move
pub fn canonical_key(board: &Board, player: Player) -> CanonicalKey {
    crate::profile!("canonical", {
        symmetric_images(board, player)
            .iter()
            .map(|(image, side)| CanonicalKey::of(image, *side))
            .min()
            .unwrap_or_else(|| CanonicalKey::of(board, player))
    })
}
