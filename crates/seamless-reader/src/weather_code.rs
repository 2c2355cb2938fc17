//! WMO weather interpretation codes from a rule table.
//!
//! Rules fire in a fixed order, first match wins: freezing rain,
//! thunderstorm, snowfall, showers, rain, low visibility, cloud cover.
//! Precipitation thresholds are per-hour rates, so the table behaves the
//! same at every request resolution.

/// Aligned input series for one window.
pub struct WeatherInputs<'a> {
    /// Total cloud cover, percent.
    pub cloud_cover: &'a [f32],
    /// Precipitation per step, millimetres.
    pub precipitation: &'a [f32],
    /// Snowfall per step, centimetres.
    pub snowfall: &'a [f32],
    /// Convective precipitation per step, millimetres.
    pub showers: &'a [f32],
    /// Gust speed, m/s.
    pub wind_gusts: &'a [f32],
    /// Convective available potential energy, J/kg.
    pub cape: &'a [f32],
    /// Surface lifted index.
    pub lifted_index: &'a [f32],
    /// Visibility, metres.
    pub visibility: &'a [f32],
    /// Freezing rain categorical rate, millimetres per step.
    pub freezing_rain: &'a [f32],
    /// Air temperature at 2 m, °C. Splits rime fog from fog.
    pub temperature: &'a [f32],
    /// Step length in seconds.
    pub dt: i64,
}

/// Treat missing inputs as "phenomenon absent".
fn or_zero(series: &[f32], index: usize) -> f32 {
    match series.get(index) {
        Some(v) if !v.is_nan() => *v,
        _ => 0.0,
    }
}

/// Compute the WMO code per sample. Samples with unknown cloud cover and no
/// firing phenomenon stay NaN.
pub fn weather_code(inputs: &WeatherInputs<'_>) -> Vec<f32> {
    let per_hour = 3600.0 / inputs.dt as f32;
    let count = inputs.cloud_cover.len();

    (0..count)
        .map(|i| {
            let precipitation_rate = or_zero(inputs.precipitation, i) * per_hour;
            let snowfall_rate = or_zero(inputs.snowfall, i) * per_hour;
            let showers_rate = or_zero(inputs.showers, i) * per_hour;
            let freezing_rate = or_zero(inputs.freezing_rain, i) * per_hour;
            let gusts = or_zero(inputs.wind_gusts, i);
            let cape = or_zero(inputs.cape, i);
            let lifted_index = or_zero(inputs.lifted_index, i);
            let visibility = match inputs.visibility.get(i) {
                Some(v) if !v.is_nan() => *v,
                _ => f32::MAX,
            };
            let cloud_cover = inputs.cloud_cover.get(i).copied().unwrap_or(f32::NAN);

            // 1. Freezing rain.
            if freezing_rate > 0.0 {
                return if freezing_rate < 1.0 { 66.0 } else { 67.0 };
            }

            // 2. Thunderstorm.
            if cape > 500.0 && lifted_index < -4.0 {
                return if gusts >= 25.0 || precipitation_rate >= 10.0 {
                    99.0
                } else if precipitation_rate >= 4.0 {
                    96.0
                } else {
                    95.0
                };
            }

            // 3. Snowfall.
            if snowfall_rate > 0.0 {
                return if snowfall_rate < 1.0 {
                    71.0
                } else if snowfall_rate < 3.0 {
                    73.0
                } else {
                    75.0
                };
            }

            // 4. Showers, when convective precipitation dominates.
            if showers_rate > 0.0 && showers_rate >= precipitation_rate * 0.5 {
                return if showers_rate < 2.5 {
                    80.0
                } else if showers_rate < 7.6 {
                    81.0
                } else {
                    82.0
                };
            }

            // 5. Rain and drizzle.
            if precipitation_rate > 0.0 {
                return if precipitation_rate < 0.1 {
                    51.0
                } else if precipitation_rate < 0.3 {
                    53.0
                } else if precipitation_rate < 0.5 {
                    55.0
                } else if precipitation_rate < 2.5 {
                    61.0
                } else if precipitation_rate < 7.6 {
                    63.0
                } else {
                    65.0
                };
            }

            // 6. Fog, depositing rime below freezing.
            if visibility < 1000.0 {
                let freezing = matches!(inputs.temperature.get(i), Some(t) if !t.is_nan() && *t <= 0.0);
                return if freezing { 48.0 } else { 45.0 };
            }

            // 7. Cloud cover.
            if cloud_cover.is_nan() {
                return f32::NAN;
            }
            if cloud_cover < 12.5 {
                0.0
            } else if cloud_cover < 37.5 {
                1.0
            } else if cloud_cover < 75.0 {
                2.0
            } else {
                3.0
            }
        })
        .collect()
}
