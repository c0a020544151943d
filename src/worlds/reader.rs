/// Little-endian readers over a byte slice with an advancing offset
///
/// Every reader leaves `offset` untouched when it fails.

pub fn read_u8_at_offset(data: &[u8], offset: &mut usize) -> Result<u8, String> {
    if *offset >= data.len() {
        return Err("Insufficient data for u8".to_string());
    }

    let value = data[*offset];
    *offset += 1;
    Ok(value)
}

pub fn read_u16_at_offset(data: &[u8], offset: &mut usize) -> Result<u16, String> {
    let bytes = take::<2>(data, *offset).ok_or_else(|| "Insufficient data for u16".to_string())?;
    *offset += 2;
    Ok(u16::from_le_bytes(bytes))
}

pub fn read_i16_at_offset(data: &[u8], offset: &mut usize) -> Result<i16, String> {
    let bytes = take::<2>(data, *offset).ok_or_else(|| "Insufficient data for i16".to_string())?;
    *offset += 2;
    Ok(i16::from_le_bytes(bytes))
}

pub fn read_u32_at_offset(data: &[u8], offset: &mut usize) -> Result<u32, String> {
    let bytes = take::<4>(data, *offset).ok_or_else(|| "Insufficient data for u32".to_string())?;
    *offset += 4;
    Ok(u32::from_le_bytes(bytes))
}

pub fn read_i32_at_offset(data: &[u8], offset: &mut usize) -> Result<i32, String> {
    let bytes = take::<4>(data, *offset).ok_or_else(|| "Insufficient data for i32".to_string())?;
    *offset += 4;
    Ok(i32::from_le_bytes(bytes))
}

/// Read a NUL-terminated string, consuming the terminator
///
/// Invalid UTF-8 is replaced rather than rejected.
pub fn read_cstring_at_offset(data: &[u8], offset: &mut usize) -> Result<String, String> {
    let rest = data
        .get(*offset..)
        .ok_or_else(|| "Insufficient data for string".to_string())?;
    let end = rest
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| format!("Missing string terminator after offset {}", *offset))?;

    let value = String::from_utf8_lossy(&rest[..end]).into_owned();
    *offset += end + 1;
    Ok(value)
}

fn take<const N: usize>(data: &[u8], offset: usize) -> Option<[u8; N]> {
    let end = offset.checked_add(N)?;
    data.get(offset..end)?.try_into().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_and_advances() {
        let data = [0x2c, 0x01, 0xff, 0xff, 0x01, 0x00, 0x00, 0x00];
        let mut offset = 0;
        assert_eq!(read_u16_at_offset(&data, &mut offset).unwrap(), 300);
        assert_eq!(read_i16_at_offset(&data, &mut offset).unwrap(), -1);
        assert_eq!(read_u32_at_offset(&data, &mut offset).unwrap(), 1);
        assert_eq!(offset, 8);
    }

    #[test]
    fn short_reads_leave_offset_unchanged() {
        let data = [0x01, 0x02, 0x03];
        let mut offset = 1;
        assert!(read_i32_at_offset(&data, &mut offset).is_err());
        assert_eq!(offset, 1);
        assert!(read_u16_at_offset(&data, &mut offset).is_ok());
        assert!(read_u8_at_offset(&data, &mut offset).is_err());
    }

    #[test]
    fn cstring_requires_terminator() {
        let data = b"oldschool1.runescape.com\0Trade\0";
        let mut offset = 0;
        assert_eq!(
            read_cstring_at_offset(data, &mut offset).unwrap(),
            "oldschool1.runescape.com"
        );
        assert_eq!(read_cstring_at_offset(data, &mut offset).unwrap(), "Trade");
        assert_eq!(offset, data.len());

        let mut offset = 0;
        assert!(read_cstring_at_offset(b"no-terminator", &mut offset).is_err());
        assert_eq!(offset, 0);
    }
}
