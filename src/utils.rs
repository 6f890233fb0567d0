/**
 * CfReco
 * Copyright (C) 2018 Sebastian Schelter
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use std::time::Duration;

pub fn to_millis(duration: Duration) -> u64 {
    (duration.as_secs() * 1_000) + (duration.subsec_nanos() / 1_000_000) as u64
}

/// Rounds half away from zero to the given number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {

    use std::time::Duration;
    use crate::utils;

    #[test]
    fn millis() {
        assert_eq!(utils::to_millis(Duration::new(2, 345_678_901)), 2_345);
    }

    #[test]
    fn rounding() {
        assert_eq!(utils::round_to(3.14159, 2), 3.14);
        assert_eq!(utils::round_to(4.005_1, 2), 4.01);
        assert_eq!(utils::round_to(-1.236, 2), -1.24);
    }
}
