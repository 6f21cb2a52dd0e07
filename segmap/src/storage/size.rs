//! Materialized size of a field

use crate::data::{DataType, FieldData, FieldMeta};
use crate::{MapError, Result};

/// Exact number of bytes `row_count` rows of `field` occupy once materialized.
///
/// Fixed-width fields take `size_of() * row_count`. String fields take the sum
/// of their element lengths; `row_count` is expected to match the element
/// count but is not consulted. A size that does not fit `usize` is an error.
pub fn get_data_size(field: &FieldMeta, row_count: usize, data: &FieldData) -> Result<usize> {
    let data_type = field.data_type;
    if data_type.is_variable_length() {
        return match data_type {
            DataType::String | DataType::VarChar => match data {
                FieldData::String(values) => Ok(values.iter().map(|v| v.len()).sum()),
                other => Err(MapError::TypeMismatch {
                    expected: data_type,
                    actual: other.kind(),
                }),
            },
            _ => Err(MapError::UnsupportedType(data_type)),
        };
    }
    if data_type == DataType::None {
        return Err(MapError::UnsupportedType(data_type));
    }

    field.size_of_rows(row_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FieldId;

    #[test]
    fn test_fixed_width_sizes() {
        let data = FieldData::Int(vec![0; 10]);
        for (dt, width) in [
            (DataType::Bool, 1),
            (DataType::Int8, 1),
            (DataType::Int16, 2),
            (DataType::Int32, 4),
            (DataType::Int64, 8),
            (DataType::Float, 4),
            (DataType::Double, 8),
        ] {
            let field = FieldMeta::new(FieldId(1), "f", dt);
            assert_eq!(get_data_size(&field, 10, &data).unwrap(), 10 * width, "{dt}");
        }
    }

    #[test]
    fn test_vector_sizes() {
        let field = FieldMeta::new(FieldId(1), "emb", DataType::FloatVector).with_dim(8);
        let data = FieldData::FloatVector { dim: 8, data: vec![0.0; 24] };
        assert_eq!(get_data_size(&field, 3, &data).unwrap(), 96);

        let field = FieldMeta::new(FieldId(2), "bits", DataType::BinaryVector).with_dim(32);
        let data = FieldData::BinaryVector { dim: 32, data: vec![0; 12] };
        assert_eq!(get_data_size(&field, 3, &data).unwrap(), 12);
    }

    #[test]
    fn test_string_size_is_sum_of_lengths() {
        let field = FieldMeta::new(FieldId(3), "s", DataType::VarChar).with_max_length(64);
        let data = FieldData::String(vec!["ab".into(), "".into(), "cde".into()]);
        // row_count is ignored for strings
        assert_eq!(get_data_size(&field, 100, &data).unwrap(), 5);

        let field = FieldMeta::new(FieldId(4), "s", DataType::String);
        let data = FieldData::String(vec!["".into(), "".into()]);
        assert_eq!(get_data_size(&field, 2, &data).unwrap(), 0);
    }

    #[test]
    fn test_unsupported_types() {
        let data = FieldData::String(vec!["{}".into()]);
        let json = FieldMeta::new(FieldId(5), "j", DataType::Json);
        assert!(matches!(
            get_data_size(&json, 1, &data),
            Err(MapError::UnsupportedType(DataType::Json))
        ));
        let none = FieldMeta::new(FieldId(6), "n", DataType::None);
        assert!(matches!(get_data_size(&none, 1, &data), Err(MapError::UnsupportedType(_))));
    }

    #[test]
    fn test_string_field_with_wrong_payload() {
        let field = FieldMeta::new(FieldId(7), "s", DataType::VarChar);
        let data = FieldData::Long(vec![1]);
        assert!(matches!(
            get_data_size(&field, 1, &data),
            Err(MapError::TypeMismatch { actual: "long_data", .. })
        ));
    }

    #[test]
    fn test_oversized_row_count() {
        let field = FieldMeta::new(FieldId(8), "id", DataType::Int64);
        let data = FieldData::Long(vec![1]);
        assert!(matches!(
            get_data_size(&field, usize::MAX / 4, &data),
            Err(MapError::SizeOverflow { rows, .. }) if rows == usize::MAX / 4
        ));
    }

    #[test]
    fn test_vector_without_dim_is_rejected() {
        let field = FieldMeta::new(FieldId(9), "emb", DataType::FloatVector);
        let data = FieldData::FloatVector { dim: 2, data: vec![1.0, 2.0] };
        assert!(matches!(get_data_size(&field, 1, &data), Err(MapError::MissingDimension(FieldId(9)))));
    }
}
