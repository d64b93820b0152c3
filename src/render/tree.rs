//! Directory tree of a library's source files, for the files page.

/// A directory or file in the source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    pub name: String,
    /// `/`-separated path from the source root
    pub path: String,
    pub is_dir: bool,
    pub children: Vec<FileNode>,
}

/// Build the tree from import paths, keeping first-seen order at each level.
pub fn build_file_tree<'a>(paths: impl IntoIterator<Item = &'a str>) -> Vec<FileNode> {
    let mut roots: Vec<FileNode> = Vec::new();
    for path in paths {
        let parts: Vec<&str> = path.split(['/', '\\']).filter(|p| !p.is_empty()).collect();
        let mut level = &mut roots;
        let mut current = String::new();
        for (i, part) in parts.iter().enumerate() {
            let is_last = i == parts.len() - 1;
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(part);

            let pos = match level.iter().position(|n| n.name == *part) {
                Some(pos) => pos,
                None => {
                    level.push(FileNode {
                        name: part.to_string(),
                        path: current.clone(),
                        is_dir: !is_last,
                        children: Vec::new(),
                    });
                    level.len() - 1
                }
            };
            level = &mut level[pos].children;
        }
    }
    roots
}
