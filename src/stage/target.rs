/*
 * Copyright 2019-2021 Wren Powell
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use relative_path::{RelativePath, RelativePathBuf};

/// The location in the virtual file system a selected file is written to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StagingTarget {
    /// The data root all staged files are written under.
    pub root: RelativePathBuf,

    /// The directory of the file relative to `root`.
    pub directory: RelativePathBuf,

    /// The name of the file.
    pub file_name: String,
}

impl StagingTarget {
    /// Compute where the file at the slash-delimited `path` is written under `root`.
    ///
    /// When `strip_leading` is set, the first ancestor of the file is dropped. That is the selected
    /// folder for a directory selection and the common root folder of an archive.
    ///
    /// This returns `None` if the path has no file name, has no ancestor to strip, or contains `.`
    /// or `..` components.
    pub fn from_asset_path(root: &RelativePath, path: &str, strip_leading: bool) -> Option<Self> {
        let mut segments = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>();

        if segments.iter().any(|segment| *segment == "." || *segment == "..") {
            return None;
        }

        let file_name = segments.pop()?;
        if strip_leading {
            if segments.is_empty() {
                return None;
            }
            segments.remove(0);
        }

        let mut directory = RelativePathBuf::new();
        for segment in segments {
            directory.push(segment);
        }

        Some(StagingTarget {
            root: root.to_owned(),
            directory,
            file_name: file_name.to_owned(),
        })
    }

    /// The directory the file is written to.
    pub fn directory_path(&self) -> RelativePathBuf {
        self.root.join(&self.directory)
    }

    /// The path the file is written to.
    pub fn path(&self) -> RelativePathBuf {
        self.directory_path().join(&self.file_name)
    }
}
