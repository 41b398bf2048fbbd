//! Built-in string table referenced by type tree string offsets with the high bit set.

/// Flag marking a type tree string offset as an index into [`COMMON_STRINGS`].
pub const COMMON_STRING_FLAG: u32 = 0x8000_0000;

/// Strings in table order; each entry occupies `len + 1` bytes of the packed buffer.
pub const COMMON_STRINGS: &[&str] = &[
	"AABB",
	"AnimationClip",
	"AnimationCurve",
	"AnimationState",
	"Array",
	"Base",
	"BitField",
	"bitset",
	"bool",
	"char",
	"ColorRGBA",
	"Component",
	"data",
	"deque",
	"double",
	"dynamic_array",
	"FastPropertyName",
	"first",
	"float",
	"Font",
	"GameObject",
	"Generic Mono",
	"GradientNEW",
	"GUID",
	"GUIStyle",
	"int",
	"list",
	"long long",
	"map",
	"Matrix4x4f",
	"MdFour",
	"MonoBehaviour",
	"MonoScript",
	"m_ByteSize",
	"m_Curve",
	"m_EditorClassIdentifier",
	"m_EditorHideFlags",
	"m_Enabled",
	"m_ExtensionPtr",
	"m_GameObject",
	"m_Index",
	"m_IsArray",
	"m_IsStatic",
	"m_MetaFlag",
	"m_Name",
	"m_ObjectHideFlags",
	"m_PrefabInternal",
	"m_PrefabParentObject",
	"m_Script",
	"m_StaticEditorFlags",
	"m_Type",
	"m_Version",
	"Object",
	"pair",
	"PPtr<Component>",
	"PPtr<GameObject>",
	"PPtr<Material>",
	"PPtr<MonoBehaviour>",
	"PPtr<MonoScript>",
	"PPtr<Object>",
	"PPtr<Prefab>",
	"PPtr<Sprite>",
	"PPtr<TextAsset>",
	"PPtr<Texture>",
	"PPtr<Texture2D>",
	"PPtr<Transform>",
	"Prefab",
	"Quaternionf",
	"Rectf",
	"RectInt",
	"RectOffset",
	"second",
	"set",
	"short",
	"size",
	"SInt16",
	"SInt32",
	"SInt64",
	"SInt8",
	"staticvector",
	"string",
	"TextAsset",
	"TextMesh",
	"Texture",
	"Texture2D",
	"Transform",
	"TypelessData",
	"UInt16",
	"UInt32",
	"UInt64",
	"UInt8",
	"unsigned int",
	"unsigned long long",
	"unsigned short",
	"vector",
	"Vector2f",
	"Vector3f",
	"Vector4f",
	"m_ScriptingClassIdentifier",
	"Gradient",
	"Type*",
	"int2_storage",
	"int3_storage",
	"BoundsInt",
	"m_CorrespondingSourceObject",
	"m_PrefabInstance",
	"m_PrefabAsset",
	"FileSize",
	"Hash128",
	"RenderingLayerMask",
];

/// Resolve a byte offset into the packed common string buffer.
pub fn common_string(offset: u32) -> Option<&'static str> {
	let mut at = 0_u32;
	for item in COMMON_STRINGS {
		if at == offset {
			return Some(item);
		}
		at += item.len() as u32 + 1;
		if at > offset {
			return None;
		}
	}
	None
}

/// Byte offset of `value` in the packed buffer, if it is a common string.
pub fn common_string_offset(value: &str) -> Option<u32> {
	let mut at = 0_u32;
	for item in COMMON_STRINGS {
		if *item == value {
			return Some(at);
		}
		at += item.len() as u32 + 1;
	}
	None
}

#[cfg(test)]
mod tests {
	use super::{common_string, common_string_offset};

	#[test]
	fn well_known_offsets_resolve() {
		assert_eq!(common_string(0), Some("AABB"));
		assert_eq!(common_string(49), Some("Array"));
		assert_eq!(common_string(222), Some("int"));
		assert_eq!(common_string(840), Some("string"));
		assert_eq!(common_string(981), Some("vector"));
	}

	#[test]
	fn offsets_inside_an_entry_do_not_resolve() {
		assert_eq!(common_string(1), None);
		assert_eq!(common_string(u32::MAX >> 1), None);
	}

	#[test]
	fn offset_lookup_inverts_resolution() {
		let offset = common_string_offset("m_Name").expect("m_Name is common");
		assert_eq!(common_string(offset), Some("m_Name"));
	}
}
