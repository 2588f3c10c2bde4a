use rust_decimal::dec;

quantity!(MegawattHourRate, "/MWh");

impl MegawattHourRate {
    /// Offer price meaning «not offering», far above any real market price.
    pub const OFFER_SENTINEL: Self = Self(dec!(9999));

    /// Bid price meaning «not bidding», far below any real market price.
    pub const BID_SENTINEL: Self = Self(dec!(-9999));
}
