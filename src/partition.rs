use std::sync::Arc;

use crate::row::Row;
use crate::statement::ColumnType;

pub type StringTable = Vec<Vec<Option<String>>>;

/// One page of a SQL API result set, every cell as the string Snowflake sent.
#[derive(Clone, Debug)]
pub struct Partition {
    pub(crate) columns: Arc<Vec<ColumnType>>,
    pub(crate) data: Arc<StringTable>,
    pub(crate) index: usize,
}

impl Partition {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Rows in this partition, counted from the data rather than the metadata
    /// since concatenated partitions carry the first partition's metadata.
    pub fn num_rows(&self) -> usize {
        self.data.len()
    }

    pub fn raw_cells(&self) -> &[Vec<Option<String>>] {
        self.data.as_ref()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }

    /// Key every cell by its column name
    pub fn rows(&self) -> Vec<Row> {
        self.data
            .iter()
            .map(|cells| {
                self.columns
                    .iter()
                    .zip(cells)
                    .map(|(column, value)| (column.name.clone(), value.clone()))
                    .collect::<Row>()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str) -> ColumnType {
        ColumnType {
            name: name.into(),
            data_type: "text".into(),
            nullable: true,
        }
    }

    #[test]
    fn rows_are_keyed_by_column() {
        let partition = Partition {
            columns: Arc::new(vec![column("name"), column("comment")]),
            data: Arc::new(vec![
                vec![Some("WH".into()), None],
                vec![Some("WH2".into()), Some("second".into())],
            ]),
            index: 0,
        };
        let rows = partition.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].opt_string("NAME").as_deref(), Some("WH"));
        assert_eq!(rows[0].opt_string("comment"), None);
        assert_eq!(rows[1].opt_string("comment").as_deref(), Some("second"));
        assert_eq!(partition.column_names().collect::<Vec<_>>(), vec!["name", "comment"]);
    }
}
