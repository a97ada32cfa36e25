//! Fixed lookup tables used by the frame setup.
//!
//! Every qp-indexed table has [`QINDEX_RANGE`] entries.

use crate::QINDEX_RANGE;

/// DC dequantizer step per quantizer index.
#[rustfmt::skip]
pub const DC_Q_LOOKUP: [i32; QINDEX_RANGE] = [
    4, 5, 6, 7, 8, 9, 10, 10, 11, 12, 13, 14, 15, 16, 17, 17,
    18, 19, 20, 20, 21, 21, 22, 22, 23, 23, 24, 25, 25, 26, 27, 28,
    29, 30, 31, 32, 33, 34, 35, 36, 37, 37, 38, 39, 40, 41, 42, 43,
    44, 45, 46, 46, 47, 48, 49, 50, 51, 52, 53, 54, 55, 56, 57, 58,
    59, 60, 61, 62, 63, 64, 65, 66, 67, 68, 69, 70, 71, 72, 73, 74,
    75, 76, 76, 77, 78, 79, 80, 81, 82, 83, 84, 85, 86, 87, 88, 89,
    91, 93, 95, 96, 98, 100, 101, 102, 104, 106, 108, 110, 112, 114, 116, 118,
    122, 124, 126, 128, 130, 132, 134, 136, 138, 140, 143, 145, 148, 151, 154, 157,
];

/// AC dequantizer step per quantizer index.
#[rustfmt::skip]
pub const AC_Q_LOOKUP: [i32; QINDEX_RANGE] = [
    4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19,
    20, 21, 22, 23, 24, 25, 26, 27, 28, 29, 30, 31, 32, 33, 34, 35,
    36, 37, 38, 39, 40, 41, 42, 43, 44, 45, 46, 47, 48, 49, 50, 51,
    52, 53, 54, 55, 56, 57, 58, 60, 62, 64, 66, 68, 70, 72, 74, 76,
    78, 80, 82, 84, 86, 88, 90, 92, 94, 96, 98, 100, 102, 104, 106, 108,
    110, 112, 114, 116, 119, 122, 125, 128, 131, 134, 137, 140, 143, 146, 149, 152,
    155, 158, 161, 164, 167, 170, 173, 177, 181, 185, 189, 193, 197, 201, 205, 209,
    213, 217, 221, 225, 229, 234, 239, 245, 249, 254, 259, 264, 269, 274, 279, 284,
];

/// Zero-bin width factor in 1/128 of the step size.
#[rustfmt::skip]
pub const Q_ZBIN_FACTORS: [i32; QINDEX_RANGE] = [
    84, 84, 84, 84, 84, 84, 84, 84, 84, 84, 84, 84, 84, 84, 84, 84,
    84, 84, 84, 84, 84, 84, 84, 84, 84, 84, 84, 84, 84, 84, 84, 84,
    84, 84, 84, 84, 84, 84, 84, 84, 84, 84, 84, 84, 84, 84, 84, 84,
    80, 80, 80, 80, 80, 80, 80, 80, 80, 80, 80, 80, 80, 80, 80, 80,
    80, 80, 80, 80, 80, 80, 80, 80, 80, 80, 80, 80, 80, 80, 80, 80,
    80, 80, 80, 80, 80, 80, 80, 80, 80, 80, 80, 80, 80, 80, 80, 80,
    80, 80, 80, 80, 80, 80, 80, 80, 80, 80, 80, 80, 80, 80, 80, 80,
    80, 80, 80, 80, 80, 80, 80, 80, 80, 80, 80, 80, 80, 80, 80, 80,
];

/// Rounding bias in 1/128 of the step size.
pub const Q_ROUNDING_FACTORS: [i32; QINDEX_RANGE] = [48; QINDEX_RANGE];

/// Auto loop filter level for inter frames.
#[rustfmt::skip]
pub const INTER_LEVEL: [i32; QINDEX_RANGE] = [
    8, 8, 8, 9, 9, 9, 9, 9, 9, 9,
    9, 9, 9, 9, 9, 9, 10, 10, 10, 10,
    10, 10, 10, 10, 10, 11, 11, 11, 11, 11,
    11, 11, 12, 12, 12, 12, 12, 12, 13, 13,
    13, 13, 13, 14, 14, 14, 14, 15, 15, 15,
    15, 16, 16, 16, 16, 17, 17, 17, 18, 18,
    18, 19, 19, 20, 20, 20, 21, 21, 22, 22,
    23, 23, 24, 24, 25, 25, 26, 26, 27, 28,
    28, 29, 30, 30, 31, 32, 33, 33, 34, 35,
    36, 37, 38, 39, 40, 41, 42, 43, 44, 45,
    46, 48, 49, 50, 51, 53, 54, 56, 57, 59,
    60, 62, 63, 63, 63, 63, 63, 63, 63, 63,
    63, 63, 63, 63, 63, 63, 63, 63,
];

/// Weight applied to the quarter-pel MV bit cost.
///
/// Visually fitted to
/// `round((2 * (2 + exp((x + 22) / 39)) + (2 + exp((x + 15) / 32))) / 3)`.
#[rustfmt::skip]
pub const QPEL_WEIGHT: [i32; QINDEX_RANGE] = [
    4, 4, 4, 4, 4, 4, 4, 4, 4, 4,
    4, 4, 4, 4, 4, 5, 5, 5, 5, 5,
    5, 5, 5, 5, 5, 5, 5, 6, 6, 6,
    6, 6, 6, 6, 6, 6, 6, 7, 7, 7,
    7, 7, 7, 7, 7, 8, 8, 8, 8, 8,
    8, 8, 9, 9, 9, 9, 9, 10, 10, 10,
    10, 11, 11, 11, 12, 12, 13, 13, 13, 13,
    14, 14, 14, 14, 15, 15, 15, 16, 16, 17,
    17, 18, 18, 19, 19, 20, 20, 20, 21, 22,
    23, 23, 24, 24, 25, 25, 26, 27, 28, 28,
    29, 30, 31, 32, 32, 33, 34, 35, 36, 37,
    38, 39, 40, 41, 42, 44, 44, 46, 47, 48,
    50, 51, 52, 54, 55, 57, 58, 61,
];

/// Split MV penalty, `24.893 * exp(0.02545 * qp)`.
#[rustfmt::skip]
pub const SPLIT_PENALTY: [i32; QINDEX_RANGE] = [
    24, 25, 26, 26, 27, 28, 29, 29, 30, 31, 32, 32, 33, 34, 35, 36,
    37, 38, 39, 40, 41, 42, 43, 44, 45, 47, 48, 49, 50, 52, 53, 54,
    56, 57, 59, 60, 62, 63, 65, 67, 68, 70, 72, 74, 76, 78, 80, 82,
    84, 86, 88, 91, 93, 95, 98, 100, 103, 106, 108, 111, 114, 117, 120, 123,
    126, 130, 133, 136, 140, 144, 147, 151, 155, 159, 163, 167, 172, 176, 181, 185,
    190, 195, 200, 205, 211, 216, 222, 227, 233, 239, 245, 252, 258, 265, 272, 279,
    286, 293, 301, 309, 317, 325, 333, 342, 351, 360, 369, 379, 388, 398, 409, 419,
    430, 441, 453, 464, 476, 488, 501, 514, 527, 541, 555, 569, 584, 599, 614, 630,
];

/// Mode tree cost of the four 16x16 intra modes (DC, V, H, TM).
pub const INTRA_16X16_TREE_PENALTY: [i32; 4] = [305, 841, 914, 1082];

/// Mode tree cost of the ten 4x4 intra sub-block modes.
pub const INTRA_4X4_TREE_PENALTY: [i32; 10] =
    [280, 622, 832, 1177, 1240, 1341, 1085, 1259, 1357, 1495];

/// Cost in 1/256 bit of coding a zero with probability `p / 256`.
#[rustfmt::skip]
pub const PROB_COST: [i32; 256] = [
    2047, 2047, 1791, 1641, 1535, 1452, 1385, 1328, 1279, 1235, 1196, 1161,
    1129, 1099, 1072, 1046, 1023, 1000, 979, 959, 940, 922, 905, 889,
    873, 858, 843, 829, 816, 803, 790, 778, 767, 755, 744, 733,
    723, 713, 703, 693, 684, 675, 666, 657, 649, 641, 633, 625,
    617, 609, 602, 594, 587, 580, 573, 567, 560, 553, 547, 541,
    534, 528, 522, 516, 511, 505, 499, 494, 488, 483, 477, 472,
    467, 462, 457, 452, 447, 442, 437, 433, 428, 424, 419, 415,
    410, 406, 401, 397, 393, 389, 385, 381, 377, 373, 369, 365,
    361, 357, 353, 349, 346, 342, 338, 335, 331, 328, 324, 321,
    317, 314, 311, 307, 304, 301, 297, 294, 291, 288, 285, 281,
    278, 275, 272, 269, 266, 263, 260, 257, 255, 252, 249, 246,
    243, 240, 238, 235, 232, 229, 227, 224, 221, 219, 216, 214,
    211, 208, 206, 203, 201, 198, 196, 194, 191, 189, 186, 184,
    181, 179, 177, 174, 172, 170, 168, 165, 163, 161, 159, 156,
    154, 152, 150, 148, 145, 143, 141, 139, 137, 135, 133, 131,
    129, 127, 125, 123, 121, 119, 117, 115, 113, 111, 109, 107,
    105, 103, 101, 99, 97, 95, 93, 92, 90, 88, 86, 84,
    82, 81, 79, 77, 75, 73, 72, 70, 68, 66, 65, 63,
    61, 60, 58, 56, 55, 53, 51, 50, 48, 46, 45, 43,
    41, 40, 38, 37, 35, 33, 32, 30, 29, 27, 25, 24,
    22, 21, 19, 18, 16, 15, 13, 12, 10, 9, 7, 6,
    4, 3, 1, 1,
];

/// Default MV probabilities, vertical component first.
#[rustfmt::skip]
pub const DEFAULT_MV_PROBS: [[u8; MV_PROB_COUNT]; 2] = [
    [162, 128, 225, 146, 172, 147, 214, 39, 156,
     128, 129, 132, 75, 145, 178, 206, 239, 254, 254],
    [164, 128, 204, 170, 119, 235, 140, 230, 228,
     128, 130, 130, 74, 148, 180, 203, 236, 254, 254],
];

/// Probabilities per MV component.
pub const MV_PROB_COUNT: usize = 19;
