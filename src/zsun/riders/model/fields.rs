//! The canonical rider field table.
//!
//! Each entry lists the preferred raw key first, followed by the historical
//! spellings still accepted on input. Encoding always uses the preferred key.

use super::{FieldDefault, FieldKind, FieldSpec};

/// Version tag of the alias table below.
pub const FIELD_TABLE_VERSION: u32 = 3;

/// Index of the identifier field in [`RIDER_FIELDS`].
pub const ID_FIELD: usize = 0;
/// Index of the display name field in [`RIDER_FIELDS`].
pub const NAME_FIELD: usize = 1;

const fn field(
    name: &'static str,
    header: &'static str,
    aliases: &'static [&'static str],
    kind: FieldKind,
    default: FieldDefault,
) -> FieldSpec {
    FieldSpec {
        name,
        header,
        aliases,
        kind,
        default,
    }
}

const NO_TEXT: FieldDefault = FieldDefault::Text("");
const ZERO: FieldDefault = FieldDefault::Float(0.0);
const ZERO_COUNT: FieldDefault = FieldDefault::Int(0);

pub const RIDER_FIELDS: &[FieldSpec] = &[
    field("zwiftId", "Zwift ID", &["zwift_id", "zwiftId", "id"], FieldKind::Identifier, NO_TEXT),
    field("name", "Name", &["name", "fullName", "full_name"], FieldKind::DisplayName, NO_TEXT),
    field(
        "countryAlpha2",
        "Country",
        &["zwiftracingapp_country_alpha2", "country_alpha2", "zwiftRacingAppCountryAlpha2"],
        FieldKind::Category,
        NO_TEXT,
    ),
    field("weightKg", "Wgt kg", &["weight_kg", "weightKg"], FieldKind::Float, ZERO),
    field("heightCm", "Ht cm", &["height_cm", "heightCm"], FieldKind::Float, ZERO),
    field("gender", "Gender", &["gender", "genderCode"], FieldKind::Category, NO_TEXT),
    field("ageYears", "Age yrs", &["age_years", "ageYears"], FieldKind::Int, ZERO_COUNT),
    field("ageGroup", "Age grp", &["age_group", "ageGroup"], FieldKind::Category, NO_TEXT),
    field(
        "zwiftFtpWatts",
        "zFTP W",
        &["zwift_ftp", "zwift_ftp_watts", "zwiftFtpWatts"],
        FieldKind::Float,
        ZERO,
    ),
    field(
        "zwiftpowerZFtpWatts",
        "zPwr zFTP",
        &["zwiftpower_zFTP", "zwiftpower_zFTP_watts", "zwiftpowerZFtpWatts"],
        FieldKind::Float,
        ZERO,
    ),
    field(
        "zwiftRacingAppZpFtpWatts",
        "ZR zFTP W",
        &["zwiftracingapp_zpFTP_w", "zwiftracingapp_zpFTP_watts", "zwiftRacingAppZpFtpWatts"],
        FieldKind::Float,
        ZERO,
    ),
    field(
        "zsunOneHourWatts",
        "1h W",
        &["zsun_one_hour_watts", "zsunOneHourWatts"],
        FieldKind::Float,
        ZERO,
    ),
    field("zsunCP", "CP W", &["zsun_CP", "zsun_CP_watts", "zsunCP"], FieldKind::Float, ZERO),
    field("zsunAWC", "AWC kJ", &["zsun_AWC", "zsun_AWC_kJ", "zsunAWC"], FieldKind::Float, ZERO),
    field(
        "zwiftZrsScore",
        "ZRS",
        &["zwift_zrs", "zwift_zrs_score", "zwiftZrsScore"],
        FieldKind::Int,
        ZERO_COUNT,
    ),
    field(
        "zwiftCatOpen",
        "Zwift Cat",
        &["zwift_cat_open", "zwiftCatOpen", "catOpen"],
        FieldKind::Category,
        NO_TEXT,
    ),
    field(
        "zwiftCatFemale",
        "Zwift Cat F",
        &["zwift_cat_female", "zwiftCatFemale", "catWomen"],
        FieldKind::Category,
        NO_TEXT,
    ),
    field(
        "zwiftRacingAppVeloRating",
        "ZR Velo",
        &["zwiftracingapp_velo_rating_30_days", "zwiftRacingAppVeloRating"],
        FieldKind::Int,
        ZERO_COUNT,
    ),
    field(
        "zwiftRacingAppCatNum",
        "ZR Cat#",
        &["zwiftracingapp_cat_num_30_days", "zwiftRacingAppCatNum"],
        FieldKind::Int,
        ZERO_COUNT,
    ),
    field(
        "zwiftRacingAppCatName",
        "ZR Cat",
        &["zwiftracingapp_cat_name_30_days", "zwiftRacingAppCatName"],
        FieldKind::Category,
        NO_TEXT,
    ),
    field(
        "zwiftRacingAppCP",
        "ZR CP W",
        &["zwiftracingapp_CP", "zwiftracingapp_CP_watts", "zwiftRacingAppCP"],
        FieldKind::Float,
        ZERO,
    ),
    field(
        "zwiftRacingAppAWC",
        "ZR AWC kJ",
        &["zwiftracingapp_AWC", "zwiftracingapp_AWC_kJ", "zwiftRacingAppAWC"],
        FieldKind::Float,
        ZERO,
    ),
    field(
        "zsunOneHourCurveCoefficient",
        "1h coeff",
        &["zsun_one_hour_curve_coefficient", "zsunOneHourCurveCoefficient"],
        FieldKind::Float,
        ZERO,
    ),
    field(
        "zsunOneHourCurveExponent",
        "1h exp",
        &["zsun_one_hour_curve_exponent", "zsunOneHourCurveExponent"],
        FieldKind::Float,
        ZERO,
    ),
    field(
        "zsunTTTPullCurveCoefficient",
        "TTT coeff",
        &["zsun_TTT_pull_curve_coefficient", "zsunTTTPullCurveCoefficient"],
        FieldKind::Float,
        ZERO,
    ),
    field(
        "zsunTTTPullCurveExponent",
        "TTT exp",
        &["zsun_TTT_pull_curve_exponent", "zsunTTTPullCurveExponent"],
        FieldKind::Float,
        ZERO,
    ),
    field(
        "zsunTTTPullCurveFitRSquared",
        "TTT R2",
        &["zsun_TTT_pull_curve_fit_r_squared", "zsunTTTPullCurveFitRSquared"],
        FieldKind::Float,
        ZERO,
    ),
    field(
        "zsunWhenCurvesFitted",
        "Curves fitted",
        &["zsun_when_curves_fitted", "zsunWhenCurvesFitted"],
        FieldKind::Timestamp,
        FieldDefault::Epoch,
    ),
];

/// Looks up a field by its canonical name.
pub fn field_index(name: &str) -> Option<usize> {
    RIDER_FIELDS.iter().position(|spec| spec.name == name)
}

/// Field indices in destination column order: the identifier first, then
/// every other field in table order.
pub fn column_order() -> impl Iterator<Item = usize> {
    std::iter::once(ID_FIELD).chain((0..RIDER_FIELDS.len()).filter(|index| *index != ID_FIELD))
}

/// Column headers in destination column order.
pub fn column_headers() -> Vec<String> {
    column_order()
        .map(|index| RIDER_FIELDS[index].header.to_string())
        .collect()
}
