use std::ops::Mul;

use crate::quantity::price::MegawattHourRate;

quantity!(MegawattHours, "MWh");

impl Mul<MegawattHourRate> for MegawattHours {
    type Output = rust_decimal::Decimal;

    fn mul(self, rate: MegawattHourRate) -> Self::Output {
        self.0 * rate.0
    }
}
