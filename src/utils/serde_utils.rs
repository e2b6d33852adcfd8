// Forms sometimes send empty strings for optional
// fields (featured image, description). Those should
// become NULL in database.
pub fn empty_string_to_none(value: Option<String>) -> Option<String> {
  match value {
    Some(s) => if s.trim().is_empty()
      { None } else { Some(s) },
    None => None
  }
}
