mod issue_table;

pub use self::issue_table::IssueTable;
