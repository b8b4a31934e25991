use volpatch::prelude::TileLayout;

pub fn positive_size(s: &str) -> Result<usize, String> {
    let size: usize = s
        .parse()
        .map_err(|_| format!("`{s}` is not a legal patch size"))?;
    if size == 0 {
        return Err("patch size must be positive".to_string());
    }
    Ok(size)
}

pub fn ratio_legal_range(s: &str) -> Result<f64, String> {
    let ratio: f64 = s
        .parse()
        .map_err(|_| format!("`{s}` is not a legal ratio"))?;
    if !(0.0..=1.0).contains(&ratio) {
        return Err(format!("ratio should be in range [0, 1], but got `{ratio}`"));
    }
    Ok(ratio)
}

pub fn layout_name(s: &str) -> Result<TileLayout, String> {
    match s {
        "cube" => Ok(TileLayout::Cube),
        "slab" => Ok(TileLayout::Slab),
        _ => Err(format!("unknown layout `{s}`, expected `cube` or `slab`")),
    }
}

/// 解析有限的`f32`，`what`用于错误信息。
fn finite_f32(s: &str, what: &str) -> Result<f32, String> {
    s.parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("`{s}` is not a legal {what}"))
}

/// CT窗位，限定在(-10000, 10000)之内。
pub fn ct_centre_legal_range(s: &str) -> Result<f32, String> {
    let centre = finite_f32(s, "CT centre value")?;
    if centre.abs() >= 10000.0 {
        return Err(format!("CT centre {centre} is outside (-10000, 10000)"));
    }
    Ok(centre)
}

/// CT窗宽，必须为正。
pub fn ct_width_legal_range(s: &str) -> Result<f32, String> {
    let width = finite_f32(s, "CT width value")?;
    if width <= 0.0 {
        return Err(format!("CT width {width} is not positive"));
    }
    Ok(width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_parsers() {
        assert_eq!(positive_size("64"), Ok(64));
        assert!(positive_size("0").is_err());
        assert!(positive_size("-3").is_err());
        assert_eq!(ratio_legal_range("0.9"), Ok(0.9));
        assert!(ratio_legal_range("1.01").is_err());
        assert_eq!(layout_name("slab"), Ok(TileLayout::Slab));
        assert!(layout_name("Cube").is_err());
        assert!(ct_centre_legal_range("-500").is_ok());
        assert!(ct_centre_legal_range("10000").is_err());
        assert!(ct_centre_legal_range("NaN").is_err());
        assert!(ct_width_legal_range("0").is_err());
        assert_eq!(ct_width_legal_range("1000"), Ok(1000.0));
        assert!(ct_width_legal_range("inf").is_err());
        assert!(ct_centre_legal_range("abc").is_err());
    }
}
